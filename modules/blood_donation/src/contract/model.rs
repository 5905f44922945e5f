use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a string does not name a member of one of the closed enums.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Closed enumeration with a canonical string form used by storage and CLI.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// ABO/Rh blood group. Matching uses exact equality, no compatibility table.
    BloodGroup, "blood group" {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
}

string_enum! {
    Sex, "sex" {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

string_enum! {
    UserRole, "role" {
        Requestor => "Requestor",
        Volunteer => "Volunteer",
        Both => "Both",
    }
}

string_enum! {
    Urgency, "urgency" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

string_enum! {
    /// Request lifecycle. Moves forward only: `Open → Matched → Closed`.
    RequestStatus, "request status" {
        Open => "Open",
        Matched => "Matched",
        Closed => "Closed",
    }
}

impl RequestStatus {
    fn rank(self) -> u8 {
        match self {
            RequestStatus::Open => 0,
            RequestStatus::Matched => 1,
            RequestStatus::Closed => 2,
        }
    }

    /// Staying in place counts as forward; `Matched → Matched` happens on re-donation.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        next.rank() >= self.rank()
    }
}

/// Public user model. Carries no credential; that stays behind the session gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub sex: Sex,
    pub locality: String,
    pub role: UserRole,
    pub donations: u32,
}

/// Registration data
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub sex: Sex,
    pub locality: String,
    pub role: UserRole,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("blood_group", &self.blood_group)
            .field("sex", &self.sex)
            .field("locality", &self.locality)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial profile update. Blood group and sex are fixed after registration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub locality: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodRequest {
    pub id: Uuid,
    pub requestor_id: Uuid,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub hospital: String,
    pub locality: String,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Data for posting a new request; the requestor comes from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBloodRequest {
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub hospital: String,
    pub locality: String,
    pub urgency: Urgency,
}

/// Append-only donation log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub request_id: Uuid,
    pub donation_date: DateTime<Utc>,
    /// Captured when the donation was recorded; later request edits don't touch it.
    pub patient_name: String,
}

/// Time left until a volunteer may donate again, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CooldownRemaining {
    pub fn from_seconds(total: i64) -> Self {
        let total = total.max(0);
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for CooldownRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Outcome of notifying the volunteers matched to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Opaque session credential handed to the caller after login/registration.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Result of a successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: SessionToken,
}
