//! Core entity structs for the Metropolis simulation.
//!
//! These are the rows the storage layer persists. Tick-based deadlines are
//! `u64` tick numbers; election deadlines are wall-clock [`DateTime`] values.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    ActivityKind, AgentState, BuildingType, CaseStatus, CreditRating, DailyPipeline, Density,
    ElectionStatus, InmateStatus, RoadDirection, Sentence, Terrain, UnitStatus, Verdict, WarningStatus, Zoning,
};
use crate::gate::PeriodGate;
use crate::ids::{
    AgentId, BondId, BuildingId, CandidateId, CaseId, CityId, ElectionId, InmateId, ParcelId,
    RentalUnitId, UserId, VehicleId, WarningId,
};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Integer grid coordinate of a tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coordinate {
    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Chebyshev (king-move) distance to `other`.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous position of a moving agent or vehicle, in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// The tile this position is closest to.
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest_tile(self) -> Coordinate {
        // Grid coordinates are far inside i32 range; `as` saturates on overflow.
        Coordinate::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Coordinate> for Position {
    fn from(c: Coordinate) -> Self {
        Self::new(f64::from(c.x), f64::from(c.y))
    }
}

// ---------------------------------------------------------------------------
// City
// ---------------------------------------------------------------------------

/// In-game time derived from the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameTime {
    /// Tick counter this time was derived from.
    pub tick: u64,
    /// Minute of the hour, 0-59.
    pub minute: u32,
    /// Hour of the day, 0-23.
    pub hour: u32,
    /// Day of the year, 1-365.
    pub day: u32,
    /// Year, starting at 1.
    pub year: u32,
}

/// Last absolute day each daily pipeline ran for a city.
///
/// Persisted so a restarted engine resumes without re-applying a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Watermarks {
    /// Last day tax penalties were applied.
    pub tax_day: Option<u64>,
    /// Last day the rent pipeline ran.
    pub rent_day: Option<u64>,
    /// Last day bond interest accrued.
    pub finance_day: Option<u64>,
}

impl Watermarks {
    /// Last day `pipeline` ran.
    pub const fn get(&self, pipeline: DailyPipeline) -> Option<u64> {
        match pipeline {
            DailyPipeline::Tax => self.tax_day,
            DailyPipeline::Rent => self.rent_day,
            DailyPipeline::Finance => self.finance_day,
        }
    }

    /// Record that `pipeline` runs for `day`.
    ///
    /// Returns `false`, leaving the watermark untouched, when `day` is not
    /// later than the last day the pipeline ran.
    pub const fn claim(&mut self, pipeline: DailyPipeline, day: u64) -> bool {
        let mut gate = PeriodGate::seeded(self.get(pipeline));
        if !gate.try_fire(day) {
            return false;
        }
        match pipeline {
            DailyPipeline::Tax => self.tax_day = Some(day),
            DailyPipeline::Rent => self.rent_day = Some(day),
            DailyPipeline::Finance => self.finance_day = Some(day),
        }
        true
    }
}

/// Budget share of each city department, in percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentFunding {
    /// Police department.
    pub police: u8,
    /// Fire department.
    pub fire: u8,
    /// Health department.
    pub health: u8,
    /// Education department.
    pub education: u8,
    /// Transit department.
    pub transit: u8,
}

impl Default for DepartmentFunding {
    fn default() -> Self {
        Self {
            police: 100,
            fire: 100,
            health: 100,
            education: 100,
            transit: 100,
        }
    }
}

/// A municipal bond the city has issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// Bond identifier.
    pub id: BondId,
    /// Amount borrowed.
    pub principal: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Absolute day the bond was issued.
    pub issued_day: u64,
    /// Days until maturity.
    pub term_days: u64,
}

impl Bond {
    /// Absolute day on which the principal is repaid.
    pub const fn maturity_day(&self) -> u64 {
        self.issued_day.saturating_add(self.term_days)
    }
}

/// Economic settings of a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEconomy {
    /// Residential tax rate in percent.
    pub tax_rate_residential: Decimal,
    /// Commercial (office) tax rate in percent.
    pub tax_rate_commercial: Decimal,
    /// Industrial tax rate in percent.
    pub tax_rate_industrial: Decimal,
    /// Names of enacted ordinances.
    pub ordinances: BTreeSet<String>,
    /// Outstanding bonds.
    pub bonds: Vec<Bond>,
    /// Department budgets.
    pub department_funding: DepartmentFunding,
    /// Current credit rating.
    pub credit_rating: CreditRating,
}

impl Default for CityEconomy {
    fn default() -> Self {
        Self {
            tax_rate_residential: Decimal::from(9),
            tax_rate_commercial: Decimal::from(9),
            tax_rate_industrial: Decimal::from(9),
            ordinances: BTreeSet::new(),
            bonds: Vec::new(),
            department_funding: DepartmentFunding::default(),
            credit_rating: CreditRating::A,
        }
    }
}

/// A simulated city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// City identifier.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Current in-game time.
    pub time: GameTime,
    /// Cash on hand.
    pub treasury: Decimal,
    /// Taxes, ordinances, bonds and budgets.
    pub economy: CityEconomy,
    /// The elected mayor of this city, if any.
    pub mayor_id: Option<UserId>,
    /// Daily pipeline watermarks.
    pub watermarks: Watermarks,
}

// ---------------------------------------------------------------------------
// Land and buildings
// ---------------------------------------------------------------------------

/// One tile of land. Unique per coordinate within a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Parcel identifier.
    pub id: ParcelId,
    /// Owning city.
    pub city_id: CityId,
    /// Grid position.
    pub coordinate: Coordinate,
    /// Terrain type.
    pub terrain: Terrain,
    /// Zoning, if painted.
    pub zoning: Option<Zoning>,
    /// Owning player, if sold.
    pub owner_id: Option<UserId>,
    /// Appraised land value.
    pub land_value: Decimal,
}

/// A structure on a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Building identifier.
    pub id: BuildingId,
    /// Owning city.
    pub city_id: CityId,
    /// Parcel the building stands on.
    pub parcel_id: ParcelId,
    /// Kind of building.
    pub building_type: BuildingType,
    /// Number of floors.
    pub floors: u32,
    /// Electricity draw.
    pub power_required: u32,
    /// Water draw.
    pub water_required: u32,
    /// Whether the grid currently supplies power.
    pub powered: bool,
    /// Whether the grid currently supplies water.
    pub has_water: bool,
    /// Construction progress in percent (0-100). Never decreases.
    pub construction_progress: u8,
    /// Tick construction started, if it has.
    pub construction_started_at: Option<u64>,
    /// Ticks needed to finish construction; 0 means instant.
    pub construction_time_ticks: u64,
    /// Density tier.
    pub density: Density,
}

impl Building {
    /// Whether construction has finished.
    pub const fn is_complete(&self) -> bool {
        self.construction_progress >= 100
    }
}

/// A road tile. Keyed by its parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    /// Parcel the road occupies.
    pub parcel_id: ParcelId,
    /// Owning city.
    pub city_id: CityId,
    /// Orientation.
    pub direction: RoadDirection,
    /// Number of lanes, at least 1.
    pub lanes: u32,
    /// Normalized occupancy in [0, 1], recomputed every tick.
    pub traffic_load: f64,
}

// ---------------------------------------------------------------------------
// Agents and vehicles
// ---------------------------------------------------------------------------

/// Daily routine of an agent, as hours of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Hour the agent wakes.
    pub wake_up: u32,
    /// Hour the agent leaves for work.
    pub work_start: u32,
    /// Hour the agent leaves work.
    pub work_end: u32,
    /// Hour the agent goes to bed.
    pub sleep_time: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            wake_up: 6,
            work_start: 9,
            work_end: 17,
            sleep_time: 22,
        }
    }
}

/// A simulated resident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Agent identifier.
    pub id: AgentId,
    /// City the agent lives in.
    pub city_id: CityId,
    /// Display name.
    pub name: String,
    /// Current position.
    pub position: Position,
    /// Final tile of the current trip.
    pub destination: Option<Coordinate>,
    /// Remaining waypoints, next first.
    pub path: VecDeque<Coordinate>,
    /// Current activity.
    pub state: AgentState,
    /// Daily routine.
    pub schedule: Schedule,
    /// Cash held by the agent.
    pub wallet_balance: Decimal,
    /// Home building, if housed.
    pub home_building_id: Option<BuildingId>,
    /// Workplace, if employed.
    pub work_building_id: Option<BuildingId>,
    /// Monthly salary.
    pub salary: Decimal,
}

/// A simulated vehicle. Owned by the simulation; not persisted long-term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// City the vehicle drives in.
    pub city_id: CityId,
    /// Agent that owns the vehicle.
    pub owner_id: AgentId,
    /// Current position.
    pub position: Position,
    /// Remaining waypoints, next first.
    pub path: VecDeque<Coordinate>,
    /// Tiles moved per tick.
    pub speed: f64,
}

// ---------------------------------------------------------------------------
// Rent and justice
// ---------------------------------------------------------------------------

/// A rentable unit inside a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalUnit {
    /// Unit identifier.
    pub id: RentalUnitId,
    /// Owning city.
    pub city_id: CityId,
    /// Building containing the unit.
    pub building_id: BuildingId,
    /// Floor number.
    pub floor: u32,
    /// Unit number on the floor.
    pub unit_number: u32,
    /// Rent due each period.
    pub monthly_rent: Decimal,
    /// Current tenant, if leased.
    pub tenant_id: Option<AgentId>,
    /// Tick the lease began.
    pub lease_start: Option<u64>,
    /// Tick up to which rent has been covered. Starts at `lease_start`.
    pub paid_through: Option<u64>,
    /// Occupancy status.
    pub status: UnitStatus,
}

/// Notice that a tenant owes rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentWarning {
    /// Warning identifier.
    pub id: WarningId,
    /// Owning city.
    pub city_id: CityId,
    /// Unit the rent is owed for.
    pub unit_id: RentalUnitId,
    /// Tenant who owes the rent.
    pub tenant_id: AgentId,
    /// Amount owed.
    pub amount_owed: Decimal,
    /// Tick the warning was issued.
    pub warning_date: u64,
    /// Tick by which the rent must be paid.
    pub due_date: u64,
    /// Lifecycle status.
    pub status: WarningStatus,
}

/// A court case over unpaid rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtCase {
    /// Case identifier.
    pub id: CaseId,
    /// Owning city.
    pub city_id: CityId,
    /// Warning that escalated into this case.
    pub warning_id: Option<WarningId>,
    /// Unit in dispute.
    pub unit_id: Option<RentalUnitId>,
    /// The tenant.
    pub defendant_id: AgentId,
    /// The landlord, if the parcel is privately owned.
    pub plaintiff_id: Option<UserId>,
    /// Amount in dispute.
    pub amount: Decimal,
    /// Tick of the hearing.
    pub hearing_date: Option<u64>,
    /// Outcome once closed.
    pub verdict: Option<Verdict>,
    /// Punishment for a guilty verdict.
    pub sentence: Option<Sentence>,
    /// Lifecycle status.
    pub status: CaseStatus,
}

/// A jail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailInmate {
    /// Record identifier.
    pub id: InmateId,
    /// Owning city.
    pub city_id: CityId,
    /// The jailed agent.
    pub agent_id: AgentId,
    /// Case that produced the sentence.
    pub case_id: Option<CaseId>,
    /// Tick of incarceration.
    pub check_in: u64,
    /// Tick of release.
    pub release_date: u64,
    /// Lifecycle status.
    pub status: InmateStatus,
}

// ---------------------------------------------------------------------------
// Elections
// ---------------------------------------------------------------------------

/// A mayoral election for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Election identifier.
    pub id: ElectionId,
    /// City electing a mayor.
    pub city_id: CityId,
    /// Current phase.
    pub status: ElectionStatus,
    /// When nomination opened.
    pub nomination_start: DateTime<Utc>,
    /// When nomination closes.
    pub nomination_end: DateTime<Utc>,
    /// When voting opened.
    pub voting_start: Option<DateTime<Utc>>,
    /// When voting closes.
    pub voting_end: Option<DateTime<Utc>>,
    /// Elected user once completed.
    pub winner_id: Option<UserId>,
}

/// A user standing for mayor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Registration identifier.
    pub id: CandidateId,
    /// Election stood in.
    pub election_id: ElectionId,
    /// The candidate.
    pub user_id: UserId,
    /// Campaign platform text.
    pub platform: Option<String>,
    /// Registration time; earlier wins ties.
    pub registered_at: DateTime<Utc>,
}

/// One ballot. Unique per (election, voter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Election voted in.
    pub election_id: ElectionId,
    /// The voter.
    pub voter_id: UserId,
    /// Chosen candidate.
    pub candidate_id: CandidateId,
    /// When the ballot was cast.
    pub cast_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

/// One entry in the city activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Category.
    pub kind: ActivityKind,
    /// Human-readable message.
    pub message: String,
    /// Structured details.
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_and_chebyshev() {
        let a = Coordinate::new(0, 0);
        let b = Coordinate::new(3, -4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.chebyshev(b), 4);
    }

    #[test]
    fn nearest_tile_rounds() {
        assert_eq!(Position::new(2.4, 3.6).nearest_tile(), Coordinate::new(2, 4));
        assert_eq!(Position::new(-0.6, 0.0).nearest_tile(), Coordinate::new(-1, 0));
    }

    #[test]
    fn bond_maturity() {
        let bond = Bond {
            id: BondId::new(),
            principal: Decimal::from(1000),
            interest_rate: Decimal::from(5),
            issued_day: 10,
            term_days: 30,
        };
        assert_eq!(bond.maturity_day(), 40);
    }

    #[test]
    fn watermark_claims_each_day_once() {
        let mut marks = Watermarks::default();
        assert!(marks.claim(DailyPipeline::Tax, 0));
        assert!(!marks.claim(DailyPipeline::Tax, 0));
        assert!(marks.claim(DailyPipeline::Rent, 0));
        assert!(marks.claim(DailyPipeline::Tax, 2));
        assert!(!marks.claim(DailyPipeline::Tax, 1));
        assert_eq!(marks.tax_day, Some(2));
        assert_eq!(marks.rent_day, Some(0));
        assert_eq!(marks.finance_day, None);
    }
}
