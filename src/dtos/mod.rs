//! DTOs module - Data Transfer Objects
//!
//! Shapes exchanged with HTTP clients. They keep the wire representation
//! separate from the entities and carry the request validation rules.

pub mod event;
pub mod invitation;
pub mod matching;

pub use event::{
    CreateEventDTO, CreateEventResponse, DeclineResponse, EventDTO, EventDetailDTO,
    EventsQuery,
};
pub use invitation::InvitationDTO;
pub use matching::{
    AutoMatchRequestDTO, AutoMatchResponse, AutoMatchingResultsDTO, MatchedUserDTO,
    PotentialMatchesResponse,
};
