//! Error types for the metropolis-agents crate.
//!
//! Simulators return [`AgentError`]; the election API returns
//! [`GovernanceError`], whose rejection variants are expected outcomes of
//! caller input rather than faults.

use metropolis_db::StoreError;
use metropolis_types::{AgentId, CandidateId, CityId, ElectionId, ElectionStatus, RentalUnitId};
use metropolis_world::WorldError;

/// Errors that can occur while simulating residents, vehicles and rent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The storage layer failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The rental unit does not exist.
    #[error("rental unit not found: {0}")]
    UnitNotFound(RentalUnitId),

    /// The rental unit has no tenant to pay rent.
    #[error("rental unit {0} has no tenant")]
    NoTenant(RentalUnitId),

    /// The tenant agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// Arithmetic overflow in a tick or money computation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}

/// Errors and rejections from the election API.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// The storage layer failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The city does not exist.
    #[error("city not found: {0}")]
    CityNotFound(CityId),

    /// The election does not exist.
    #[error("election not found: {0}")]
    ElectionNotFound(ElectionId),

    /// The candidate does not exist.
    #[error("candidate not found: {0}")]
    CandidateNotFound(CandidateId),

    /// The city already has an election in nomination or voting.
    #[error("city {0} already has an active election")]
    AlreadyActive(CityId),

    /// The election is not in the phase this call requires.
    #[error("election {election} is {actual:?}, expected {expected:?}")]
    WrongPhase {
        /// The election.
        election: ElectionId,
        /// Phase the call requires.
        expected: ElectionStatus,
        /// Phase the election is in.
        actual: ElectionStatus,
    },

    /// The current phase's deadline has passed.
    #[error("the {phase:?} deadline of election {election} has passed")]
    DeadlinePassed {
        /// The election.
        election: ElectionId,
        /// The expired phase.
        phase: ElectionStatus,
    },

    /// The current phase's deadline has not been reached yet.
    #[error("the {phase:?} deadline of election {election} has not been reached")]
    DeadlineNotReached {
        /// The election.
        election: ElectionId,
        /// The still-running phase.
        phase: ElectionStatus,
    },

    /// The user already stands in this election.
    #[error("user is already a candidate in election {0}")]
    AlreadyCandidate(ElectionId),

    /// The voter already cast a ballot in this election.
    #[error("voter already voted in election {0}")]
    AlreadyVoted(ElectionId),

    /// The candidate stands in a different election.
    #[error("candidate {candidate} does not belong to election {election}")]
    CandidateNotInElection {
        /// The candidate.
        candidate: CandidateId,
        /// The election voted in.
        election: ElectionId,
    },

    /// A deadline could not be represented.
    #[error("election deadline out of range")]
    TimeOverflow,
}
