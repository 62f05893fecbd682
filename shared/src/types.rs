use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// User Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// House Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    /// First day of week: 0 = Sunday, 1 = Monday, ... 6 = Saturday
    pub week_start_day: u8,
    /// Weeks between group rotations, >= 1
    pub rotation_weeks: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHouseSettingsRequest {
    pub week_start_day: Option<u8>,
    pub rotation_weeks: Option<u32>,
}

// ============================================================================
// Task Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    Daily,
    Weekly,
}

impl TaskFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFrequency::Daily => "daily",
            TaskFrequency::Weekly => "weekly",
        }
    }
}

impl FromStr for TaskFrequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(TaskFrequency::Daily),
            "weekly" => Ok(TaskFrequency::Weekly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub house_id: Uuid,
    pub name: String,
    pub points: i64,
    pub frequency: TaskFrequency,
    /// For weekly tasks: minimum completions in the week to earn the points.
    /// None means a single completion counts.
    pub weekly_minimum: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub points: i64,
    pub frequency: TaskFrequency,
    pub weekly_minimum: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub points: Option<i64>,
    pub frequency: Option<TaskFrequency>,
    pub weekly_minimum: Option<Option<i64>>,
}

// ============================================================================
// Task Group Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroup {
    pub id: Uuid,
    pub house_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroupWithTasks {
    pub group: TaskGroup,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub task_ids: Vec<Uuid>,
}

/// The task set is replaced wholesale on update, never diffed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub task_ids: Option<Vec<Uuid>>,
}

// ============================================================================
// Weekly Assignment Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAssignment {
    pub id: Uuid,
    pub house_id: Uuid,
    pub user_id: Uuid,
    pub week_start_date: NaiveDate,
    pub task_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAssignment {
    pub user_id: Uuid,
    pub task_group_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAssignmentsRequest {
    pub week_start_date: NaiveDate,
    pub assignments: Vec<AssignmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub user_id: Uuid,
    /// None clears the member's group for the week.
    pub task_group_id: Option<Uuid>,
}

// ============================================================================
// Completion Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Validated,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Pending => "pending",
            CompletionStatus::Validated => "validated",
        }
    }
}

impl FromStr for CompletionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CompletionStatus::Pending),
            "validated" => Ok(CompletionStatus::Validated),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub id: Uuid,
    pub house_id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub week_start_date: NaiveDate,
    /// Today for daily tasks, the week start for weekly tasks. Distinguishes
    /// same-day duplicates for daily tasks; a display key, not a constraint.
    pub completion_date: NaiveDate,
    pub points_earned: i64,
    pub status: CompletionStatus,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTaskRequest {
    pub task_id: Uuid,
    pub week_start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraCompletion {
    pub id: Uuid,
    pub house_id: Uuid,
    pub user_id: Uuid,
    pub week_start_date: NaiveDate,
    pub name: String,
    pub points_earned: i64,
    pub status: CompletionStatus,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddExtraCompletionRequest {
    pub week_start_date: NaiveDate,
    pub name: String,
    pub points: i64,
}

// ============================================================================
// Weekly Score / Config Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScore {
    pub id: Uuid,
    pub house_id: Uuid,
    pub user_id: Uuid,
    pub week_start_date: NaiveDate,
    pub points_target: i64,
    pub points_earned: i64,
    /// Deficit rolled in from the prior week, informational only.
    pub points_carried_over: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyConfig {
    pub id: Uuid,
    pub house_id: Uuid,
    pub week_start_date: NaiveDate,
    pub points_target_per_person: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessWeekEndRequest {
    pub week_start_date: NaiveDate,
    pub base_target: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertWeeklyConfigRequest {
    pub week_start_date: NaiveDate,
    pub points_target_per_person: i64,
}

// ============================================================================
// Swap Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapType {
    Temporary,
    Permanent,
}

impl SwapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapType::Temporary => "temporary",
            SwapType::Permanent => "permanent",
        }
    }
}

impl FromStr for SwapType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temporary" => Ok(SwapType::Temporary),
            "permanent" => Ok(SwapType::Permanent),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Expired => "expired",
        }
    }

    /// The only legal transitions: the recipient answers a pending request,
    /// and an accepted temporary swap ages out.
    pub fn can_transition_to(&self, next: SwapStatus) -> bool {
        matches!(
            (self, next),
            (SwapStatus::Pending, SwapStatus::Accepted)
                | (SwapStatus::Pending, SwapStatus::Rejected)
                | (SwapStatus::Accepted, SwapStatus::Expired)
        )
    }
}

impl FromStr for SwapStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SwapStatus::Pending),
            "accepted" => Ok(SwapStatus::Accepted),
            "rejected" => Ok(SwapStatus::Rejected),
            "expired" => Ok(SwapStatus::Expired),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSwap {
    pub id: Uuid,
    pub house_id: Uuid,
    pub task_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub week_start_date: NaiveDate,
    pub swap_type: SwapType,
    /// For temporary swaps: the single day being covered.
    pub swap_date: Option<NaiveDate>,
    pub status: SwapStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSwapRequest {
    pub task_id: Uuid,
    pub to_user_id: Uuid,
    pub week_start_date: NaiveDate,
    pub swap_type: SwapType,
    pub swap_date: Option<NaiveDate>,
}

// ============================================================================
// API Envelope Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_frequency_from_str() {
        assert_eq!("daily".parse(), Ok(TaskFrequency::Daily));
        assert_eq!("WEEKLY".parse(), Ok(TaskFrequency::Weekly));
        assert!("monthly".parse::<TaskFrequency>().is_err());
    }

    #[test]
    fn test_completion_status_from_str() {
        assert_eq!("pending".parse(), Ok(CompletionStatus::Pending));
        assert_eq!("Validated".parse(), Ok(CompletionStatus::Validated));
        assert!("rejected".parse::<CompletionStatus>().is_err());
    }

    #[test]
    fn test_swap_status_transitions() {
        assert!(SwapStatus::Pending.can_transition_to(SwapStatus::Accepted));
        assert!(SwapStatus::Pending.can_transition_to(SwapStatus::Rejected));
        assert!(SwapStatus::Accepted.can_transition_to(SwapStatus::Expired));

        assert!(!SwapStatus::Pending.can_transition_to(SwapStatus::Expired));
        assert!(!SwapStatus::Accepted.can_transition_to(SwapStatus::Rejected));
        assert!(!SwapStatus::Rejected.can_transition_to(SwapStatus::Accepted));
        assert!(!SwapStatus::Expired.can_transition_to(SwapStatus::Pending));
    }

    #[test]
    fn test_swap_type_as_str_round_trip() {
        assert_eq!("temporary".parse(), Ok(SwapType::Temporary));
        assert_eq!("permanent".parse(), Ok(SwapType::Permanent));
        assert_eq!(SwapType::Temporary.as_str(), "temporary");
        assert!("weekly".parse::<SwapType>().is_err());
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new(42);
        assert_eq!(success.data, 42);
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&TaskFrequency::Daily).unwrap(), "\"daily\"");
        assert_eq!(serde_json::to_string(&SwapStatus::Accepted).unwrap(), "\"accepted\"");
        assert_eq!(
            serde_json::from_str::<CompletionStatus>("\"validated\"").unwrap(),
            CompletionStatus::Validated
        );
    }
}
