//! Enumeration types for the Metropolis simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Land
// ---------------------------------------------------------------------------

/// Terrain of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Terrain {
    /// Buildable flat land.
    Land,
    /// Open water; impassable on foot.
    Water,
    /// Woodland.
    Forest,
    /// Elevated ground.
    Hill,
}

/// Zoning designation painted onto a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Zoning {
    /// Homes and apartments.
    Residential,
    /// Offices and shops.
    Commercial,
    /// Factories and warehouses.
    Industrial,
    /// Public services and utilities.
    Civic,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// The kind of structure standing on a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BuildingType {
    /// Detached single-family house.
    House,
    /// Multi-floor apartment block.
    Apartment,
    /// Office tower.
    Office,
    /// Retail shop.
    Shop,
    /// Manufacturing plant.
    Factory,
    /// Storage warehouse.
    Warehouse,
    /// Power generator; supplies the electricity grid.
    PowerPlant,
    /// Water tower; supplies the water grid.
    WaterTower,
    /// Road tile. Built instantly.
    Road,
    /// Public park.
    Park,
    /// Police station.
    PoliceStation,
    /// Fire station.
    FireStation,
    /// Hospital.
    Hospital,
    /// School.
    School,
    /// City hall.
    CityHall,
}

impl BuildingType {
    /// The demand sector this building counts toward, if any.
    pub const fn sector(self) -> Option<Sector> {
        match self {
            Self::House | Self::Apartment => Some(Sector::Residential),
            Self::Office | Self::Shop => Some(Sector::Office),
            Self::Factory | Self::Warehouse => Some(Sector::Industrial),
            Self::PowerPlant
            | Self::WaterTower
            | Self::Road
            | Self::Park
            | Self::PoliceStation
            | Self::FireStation
            | Self::Hospital
            | Self::School
            | Self::CityHall => None,
        }
    }

    /// Whether this building supplies a utility grid.
    ///
    /// Providers are always considered powered and watered, and their own
    /// requirements never count toward grid demand.
    pub const fn is_provider(self) -> bool {
        matches!(self, Self::PowerPlant | Self::WaterTower)
    }
}

/// Demand sector used by the R/O/I model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Sector {
    /// Housing.
    Residential,
    /// Offices and retail.
    Office,
    /// Manufacturing and storage.
    Industrial,
}

/// Building density tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Density {
    /// Low density.
    Low,
    /// Medium density.
    Medium,
    /// High density.
    High,
}

/// Orientation of a road tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RoadDirection {
    /// Runs along the y axis.
    NorthSouth,
    /// Runs along the x axis.
    EastWest,
    /// Junction of several roads.
    Intersection,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// What an agent is currently doing.
///
/// Only `Idle`, `Traveling`, `Working` and `InJail` are driven by the
/// simulation; the remaining states are reserved for external handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentState {
    /// Not doing anything in particular.
    Idle,
    /// Following a path.
    Traveling,
    /// At the workplace.
    Working,
    /// Shopping.
    Shopping,
    /// Asleep.
    Sleeping,
    /// Socializing.
    Socializing,
    /// Serving a jail sentence.
    InJail,
}

// ---------------------------------------------------------------------------
// Rent and justice
// ---------------------------------------------------------------------------

/// Occupancy status of a rental unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum UnitStatus {
    /// No tenant.
    Vacant,
    /// Leased to a tenant.
    Occupied,
}

/// Lifecycle of an unpaid-rent warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WarningStatus {
    /// Issued and awaiting payment.
    Pending,
    /// Rent was paid.
    Paid,
    /// Deadline passed; a court case was opened.
    Escalated,
}

/// Lifecycle of a court case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CaseStatus {
    /// Awaiting its hearing.
    Pending,
    /// Adjudicated.
    Closed,
}

/// Outcome of a court hearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Verdict {
    /// The defendant owes the rent.
    Guilty,
    /// The debt was settled before the hearing.
    Dismissed,
}

/// Punishment handed down with a guilty verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Sentence {
    /// Eviction plus a fixed jail term.
    Jail,
}

/// Status of a jail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum InmateStatus {
    /// Currently serving.
    Incarcerated,
    /// Sentence served.
    Released,
}

// ---------------------------------------------------------------------------
// Politics and finance
// ---------------------------------------------------------------------------

/// Phase of a mayoral election.
///
/// A city with no election row is implicitly in the "none" phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ElectionStatus {
    /// Candidates may register.
    Nomination,
    /// Ballots may be cast.
    Voting,
    /// Votes tallied; no further changes.
    Completed,
}

impl ElectionStatus {
    /// Whether the election still accepts state transitions.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Nomination | Self::Voting)
    }
}

/// Municipal credit rating, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CreditRating {
    /// Highest quality.
    #[serde(rename = "AAA")]
    Aaa,
    /// High quality.
    #[serde(rename = "AA")]
    Aa,
    /// Upper medium grade.
    #[serde(rename = "A")]
    A,
    /// Lower medium grade.
    #[serde(rename = "BBB")]
    Bbb,
    /// Speculative.
    #[serde(rename = "BB")]
    Bb,
    /// Highly speculative.
    #[serde(rename = "B")]
    B,
    /// Near default.
    #[serde(rename = "C")]
    C,
}

/// A pipeline that runs at most once per simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyPipeline {
    /// Punitive tax penalties.
    Tax,
    /// Rent warnings and justice.
    Rent,
    /// Bond servicing and credit rating.
    Finance,
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

/// Category of a notable transition written to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActivityKind {
    /// A building finished construction.
    ConstructionComplete,
    /// Residents left because of high residential tax.
    ResidentExodus,
    /// Office salaries were cut because of high commercial tax.
    SalaryCut,
    /// An industrial building was destroyed because of high industrial tax.
    BuildingDestroyed,
    /// A rent warning was issued.
    RentWarning,
    /// A rent warning was escalated to a court case.
    CourtCaseOpened,
    /// A court case was adjudicated.
    CourtVerdict,
    /// A tenant was jailed.
    Jailed,
    /// An inmate was released.
    Released,
    /// An election event (start, candidacy, phase change, result).
    Election,
    /// A treasury or credit event.
    Finance,
}
