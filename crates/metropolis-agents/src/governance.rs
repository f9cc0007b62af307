//! Mayoral elections.
//!
//! An election moves through three phases on wall-clock deadlines:
//!
//! ```text
//! (none) --start--> Nomination --open_voting--> Voting --tally--> Completed
//! ```
//!
//! Nomination lasts `nomination_hours`, voting `voting_hours`. Each call
//! that changes phase checks the deadline itself; [`ElectionService::poll`]
//! drives elections forward for callers that do not.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use metropolis_db::{ActivityLogger, CityRepository, ElectionRepository, StoreError};
use metropolis_types::{
    ActivityKind, Candidate, CandidateId, CityId, Election, ElectionId, ElectionStatus, SimEvent,
    UserId, Vote,
};

use crate::config::GovernanceConfig;
use crate::error::GovernanceError;

/// Runs elections for every city.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectionService {
    config: GovernanceConfig,
}

fn deadline(from: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>, GovernanceError> {
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|d| from.checked_add_signed(d))
        .ok_or(GovernanceError::TimeOverflow)
}

fn load<S>(store: &S, id: ElectionId) -> Result<Election, GovernanceError>
where
    S: ElectionRepository + ?Sized,
{
    store
        .get_election(id)?
        .ok_or(GovernanceError::ElectionNotFound(id))
}

fn require_phase(election: &Election, expected: ElectionStatus) -> Result<(), GovernanceError> {
    if election.status == expected {
        return Ok(());
    }
    Err(GovernanceError::WrongPhase {
        election: election.id,
        expected,
        actual: election.status,
    })
}

impl ElectionService {
    /// Create a service.
    pub const fn new(config: GovernanceConfig) -> Self {
        Self { config }
    }

    /// Ticks between engine polls.
    pub const fn poll_interval_ticks(&self) -> u64 {
        self.config.poll_interval_ticks
    }

    /// Open nominations for a new election in `city`.
    pub fn start_election<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: DateTime<Utc>,
    ) -> Result<Election, GovernanceError>
    where
        S: ElectionRepository + CityRepository + ?Sized,
    {
        if store.get_city(city)?.is_none() {
            return Err(GovernanceError::CityNotFound(city));
        }
        if store.active_election(city)?.is_some() {
            return Err(GovernanceError::AlreadyActive(city));
        }
        let election = Election {
            id: ElectionId::new(),
            city_id: city,
            status: ElectionStatus::Nomination,
            nomination_start: now,
            nomination_end: deadline(now, self.config.nomination_hours)?,
            voting_start: None,
            voting_end: None,
            winner_id: None,
        };
        store
            .insert_election(election.clone())
            .map_err(|e| match e {
                StoreError::Conflict { .. } => GovernanceError::AlreadyActive(city),
                other => other.into(),
            })?;
        tracing::info!(
            election_id = %election.id,
            %city,
            nomination_end = %election.nomination_end,
            "election started"
        );
        Ok(election)
    }

    /// Register `user` as a candidate.
    pub fn run_for_mayor<S>(
        &self,
        store: &mut S,
        election_id: ElectionId,
        user: UserId,
        platform: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Candidate, GovernanceError>
    where
        S: ElectionRepository + ?Sized,
    {
        let election = load(&*store, election_id)?;
        require_phase(&election, ElectionStatus::Nomination)?;
        if now >= election.nomination_end {
            return Err(GovernanceError::DeadlinePassed {
                election: election_id,
                phase: ElectionStatus::Nomination,
            });
        }
        if store
            .list_candidates(election_id)?
            .iter()
            .any(|c| c.user_id == user)
        {
            return Err(GovernanceError::AlreadyCandidate(election_id));
        }
        let candidate = Candidate {
            id: CandidateId::new(),
            election_id,
            user_id: user,
            platform,
            registered_at: now,
        };
        store
            .insert_candidate(candidate.clone())
            .map_err(|e| match e {
                StoreError::Conflict { .. } => GovernanceError::AlreadyCandidate(election_id),
                other => other.into(),
            })?;
        tracing::info!(%election_id, %user, "candidate registered");
        Ok(candidate)
    }

    /// Close nominations and open the ballot.
    pub fn open_voting<S>(
        &self,
        store: &mut S,
        election_id: ElectionId,
        now: DateTime<Utc>,
    ) -> Result<Election, GovernanceError>
    where
        S: ElectionRepository + ?Sized,
    {
        let mut election = load(&*store, election_id)?;
        require_phase(&election, ElectionStatus::Nomination)?;
        if now < election.nomination_end {
            return Err(GovernanceError::DeadlineNotReached {
                election: election_id,
                phase: ElectionStatus::Nomination,
            });
        }
        election.status = ElectionStatus::Voting;
        election.voting_start = Some(now);
        election.voting_end = Some(deadline(now, self.config.voting_hours)?);
        store.update_election(&election)?;
        tracing::info!(%election_id, "voting opened");
        Ok(election)
    }

    /// Cast `voter`'s ballot for `candidate`.
    pub fn vote<S>(
        &self,
        store: &mut S,
        election_id: ElectionId,
        voter: UserId,
        candidate: CandidateId,
        now: DateTime<Utc>,
    ) -> Result<(), GovernanceError>
    where
        S: ElectionRepository + ?Sized,
    {
        let election = load(&*store, election_id)?;
        require_phase(&election, ElectionStatus::Voting)?;
        if election.voting_end.is_some_and(|end| now >= end) {
            return Err(GovernanceError::DeadlinePassed {
                election: election_id,
                phase: ElectionStatus::Voting,
            });
        }
        let stands = store
            .get_candidate(candidate)?
            .ok_or(GovernanceError::CandidateNotFound(candidate))?;
        if stands.election_id != election_id {
            return Err(GovernanceError::CandidateNotInElection {
                candidate,
                election: election_id,
            });
        }
        if store.has_voted(election_id, voter)? {
            return Err(GovernanceError::AlreadyVoted(election_id));
        }
        store
            .insert_vote(Vote {
                election_id,
                voter_id: voter,
                candidate_id: candidate,
                cast_at: now,
            })
            .map_err(|e| match e {
                StoreError::Conflict { .. } => GovernanceError::AlreadyVoted(election_id),
                other => other.into(),
            })?;
        tracing::debug!(%election_id, %voter, "vote cast");
        Ok(())
    }

    /// Count the ballots, record the winner and appoint the mayor.
    ///
    /// The most votes wins; ties go to the earliest registration. An
    /// election without votes completes with no winner and leaves the
    /// current mayor in office.
    pub fn tally_votes<S>(
        &self,
        store: &mut S,
        election_id: ElectionId,
        now: DateTime<Utc>,
    ) -> Result<Election, GovernanceError>
    where
        S: ElectionRepository + CityRepository + ?Sized,
    {
        let mut election = load(&*store, election_id)?;
        require_phase(&election, ElectionStatus::Voting)?;
        if election.voting_end.is_some_and(|end| now < end) {
            return Err(GovernanceError::DeadlineNotReached {
                election: election_id,
                phase: ElectionStatus::Voting,
            });
        }

        let mut counts: BTreeMap<CandidateId, u64> = BTreeMap::new();
        for vote in store.list_votes(election_id)? {
            let slot = counts.entry(vote.candidate_id).or_default();
            *slot = slot.saturating_add(1);
        }
        // Candidates come back in registration order, so the first
        // strictly-greater count wins ties for the earliest registrant.
        let mut winner: Option<(UserId, u64)> = None;
        for candidate in store.list_candidates(election_id)? {
            let votes = counts.get(&candidate.id).copied().unwrap_or(0);
            if votes > 0 && winner.is_none_or(|(_, best)| votes > best) {
                winner = Some((candidate.user_id, votes));
            }
        }

        election.status = ElectionStatus::Completed;
        election.winner_id = winner.map(|(user, _)| user);
        store.update_election(&election)?;
        if let Some(mayor) = election.winner_id {
            store.set_mayor(election.city_id, Some(mayor))?;
        }
        tracing::info!(
            %election_id,
            winner = ?election.winner_id,
            votes = winner.map_or(0, |(_, v)| v),
            "election tallied"
        );
        Ok(election)
    }

    /// Advance every active election whose phase deadline has passed.
    pub fn poll<S>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, GovernanceError>
    where
        S: ElectionRepository + CityRepository + ?Sized,
    {
        let mut events = Vec::new();
        for election in store.list_active_elections()? {
            match election.status {
                ElectionStatus::Nomination if now >= election.nomination_end => {
                    self.open_voting(store, election.id, now)?;
                    activity.log(
                        ActivityKind::Election,
                        "nominations closed, voting is open",
                        serde_json::json!({ "election_id": election.id }),
                    );
                    events.push(SimEvent::ElectionPhaseChanged {
                        election_id: election.id,
                        status: ElectionStatus::Voting,
                    });
                }
                ElectionStatus::Voting if election.voting_end.is_none_or(|end| now >= end) => {
                    let done = self.tally_votes(store, election.id, now)?;
                    activity.log(
                        ActivityKind::Election,
                        "election closed",
                        serde_json::json!({
                            "election_id": done.id,
                            "winner_id": done.winner_id,
                        }),
                    );
                    events.push(SimEvent::ElectionPhaseChanged {
                        election_id: done.id,
                        status: ElectionStatus::Completed,
                    });
                    if let Some(user_id) = done.winner_id {
                        events.push(SimEvent::MayorElected {
                            city_id: done.city_id,
                            user_id,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use metropolis_db::{MemoryStore, RecordingActivityLogger};
    use metropolis_types::{City, CityEconomy, GameTime, Watermarks};
    use rust_decimal_macros::dec;

    use super::*;

    fn city(store: &mut MemoryStore) -> CityId {
        let id = CityId::new();
        store
            .insert_city(City {
                id,
                name: String::from("Polis"),
                time: GameTime {
                    tick: 0,
                    minute: 0,
                    hour: 8,
                    day: 1,
                    year: 1,
                },
                treasury: dec!(0),
                economy: CityEconomy::default(),
                mayor_id: None,
                watermarks: Watermarks::default(),
            })
            .unwrap();
        id
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn hours(h: i64) -> TimeDelta {
        TimeDelta::try_hours(h).unwrap()
    }

    #[test]
    fn second_active_election_is_rejected() {
        let mut store = MemoryStore::new();
        let c = city(&mut store);
        let svc = ElectionService::default();
        svc.start_election(&mut store, c, t0()).unwrap();
        assert!(matches!(
            svc.start_election(&mut store, c, t0()),
            Err(GovernanceError::AlreadyActive(_))
        ));
    }

    #[test]
    fn full_cycle_appoints_mayor() {
        let mut store = MemoryStore::new();
        let c = city(&mut store);
        let svc = ElectionService::default();
        let e = svc.start_election(&mut store, c, t0()).unwrap();
        assert_eq!(e.nomination_end, t0() + hours(72));

        let (alice, bob) = (UserId::new(), UserId::new());
        let a = svc
            .run_for_mayor(&mut store, e.id, alice, None, t0() + hours(1))
            .unwrap();
        let b = svc
            .run_for_mayor(&mut store, e.id, bob, Some(String::from("parks")), t0() + hours(2))
            .unwrap();
        assert!(matches!(
            svc.run_for_mayor(&mut store, e.id, alice, None, t0() + hours(3)),
            Err(GovernanceError::AlreadyCandidate(_))
        ));

        assert!(matches!(
            svc.open_voting(&mut store, e.id, t0() + hours(71)),
            Err(GovernanceError::DeadlineNotReached { .. })
        ));
        let voting = svc.open_voting(&mut store, e.id, t0() + hours(72)).unwrap();
        assert_eq!(voting.voting_end, Some(t0() + hours(120)));

        let at = t0() + hours(80);
        svc.vote(&mut store, e.id, UserId::new(), b.id, at).unwrap();
        svc.vote(&mut store, e.id, UserId::new(), b.id, at).unwrap();
        svc.vote(&mut store, e.id, UserId::new(), a.id, at).unwrap();

        assert!(matches!(
            svc.tally_votes(&mut store, e.id, t0() + hours(100)),
            Err(GovernanceError::DeadlineNotReached { .. })
        ));
        let done = svc.tally_votes(&mut store, e.id, t0() + hours(120)).unwrap();
        assert_eq!(done.status, ElectionStatus::Completed);
        assert_eq!(done.winner_id, Some(bob));
        assert_eq!(store.get_city(c).unwrap().unwrap().mayor_id, Some(bob));
    }

    #[test]
    fn tie_goes_to_earliest_registration() {
        let mut store = MemoryStore::new();
        let c = city(&mut store);
        let svc = ElectionService::default();
        let e = svc.start_election(&mut store, c, t0()).unwrap();
        let late = svc
            .run_for_mayor(&mut store, e.id, UserId::new(), None, t0() + hours(5))
            .unwrap();
        let early_user = UserId::new();
        let early = svc
            .run_for_mayor(&mut store, e.id, early_user, None, t0() + hours(1))
            .unwrap();
        svc.open_voting(&mut store, e.id, t0() + hours(72)).unwrap();
        svc.vote(&mut store, e.id, UserId::new(), late.id, t0() + hours(73))
            .unwrap();
        svc.vote(&mut store, e.id, UserId::new(), early.id, t0() + hours(73))
            .unwrap();
        let done = svc.tally_votes(&mut store, e.id, t0() + hours(200)).unwrap();
        assert_eq!(done.winner_id, Some(early_user));
    }

    #[test]
    fn ballot_rules_are_enforced() {
        let mut store = MemoryStore::new();
        let c = city(&mut store);
        let svc = ElectionService::default();
        let e = svc.start_election(&mut store, c, t0()).unwrap();
        let cand = svc
            .run_for_mayor(&mut store, e.id, UserId::new(), None, t0())
            .unwrap();
        let voter = UserId::new();

        // No voting during nomination.
        assert!(matches!(
            svc.vote(&mut store, e.id, voter, cand.id, t0()),
            Err(GovernanceError::WrongPhase { .. })
        ));
        svc.open_voting(&mut store, e.id, t0() + hours(72)).unwrap();
        // No late candidacy.
        assert!(matches!(
            svc.run_for_mayor(&mut store, e.id, UserId::new(), None, t0() + hours(73)),
            Err(GovernanceError::WrongPhase { .. })
        ));

        svc.vote(&mut store, e.id, voter, cand.id, t0() + hours(73))
            .unwrap();
        assert!(matches!(
            svc.vote(&mut store, e.id, voter, cand.id, t0() + hours(74)),
            Err(GovernanceError::AlreadyVoted(_))
        ));

        // A candidate of another city's election is not on this ballot.
        let other_city = city(&mut store);
        let other = svc.start_election(&mut store, other_city, t0()).unwrap();
        let stranger = svc
            .run_for_mayor(&mut store, other.id, UserId::new(), None, t0())
            .unwrap();
        assert!(matches!(
            svc.vote(&mut store, e.id, UserId::new(), stranger.id, t0() + hours(75)),
            Err(GovernanceError::CandidateNotInElection { .. })
        ));

        assert!(matches!(
            svc.vote(&mut store, e.id, UserId::new(), cand.id, t0() + hours(120)),
            Err(GovernanceError::DeadlinePassed { .. })
        ));
    }

    #[test]
    fn poll_advances_phases_and_handles_empty_ballot() {
        let mut store = MemoryStore::new();
        let c = city(&mut store);
        let svc = ElectionService::default();
        let mut log = RecordingActivityLogger::new();
        let e = svc.start_election(&mut store, c, t0()).unwrap();

        assert!(svc.poll(&mut store, t0() + hours(10), &mut log).unwrap().is_empty());
        let events = svc.poll(&mut store, t0() + hours(72), &mut log).unwrap();
        assert_eq!(
            events,
            vec![SimEvent::ElectionPhaseChanged {
                election_id: e.id,
                status: ElectionStatus::Voting
            }]
        );
        let events = svc.poll(&mut store, t0() + hours(200), &mut log).unwrap();
        assert_eq!(events.len(), 1);
        let done = store.get_election(e.id).unwrap().unwrap();
        assert_eq!(done.status, ElectionStatus::Completed);
        assert_eq!(done.winner_id, None);
        assert_eq!(store.get_city(c).unwrap().unwrap().mayor_id, None);
        assert_eq!(log.count(ActivityKind::Election), 2);

        // Completed elections free the city for a new one.
        svc.start_election(&mut store, c, t0() + hours(201)).unwrap();
    }
}
