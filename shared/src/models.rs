//! Booking webhook data models.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Lifecycle status of a rental booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    OnLoan,
    Returned,
    Archived,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::OnLoan => "On Loan",
            Self::Returned => "Returned",
            Self::Archived => "Archived",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Google Calendar color id for events of a booking in this status.
    pub fn color_id(&self) -> &'static str {
        match self {
            Self::Confirmed => "10",
            Self::OnLoan => "11",
            Self::Returned => "8",
            _ => "1",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Confirmed" => Ok(Self::Confirmed),
            "On Loan" => Ok(Self::OnLoan),
            "Returned" => Ok(Self::Returned),
            "Archived" => Ok(Self::Archived),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(Error::Validation(format!("Unknown booking status '{}'", other))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking snapshot delivered by the webhook router.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Booking {
    /// Opaque row id, echoed back untouched
    #[serde(rename = "rowId", default)]
    pub row_id: serde_json::Value,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: String,
    #[serde(rename = "pickUpDate", default, deserialize_with = "optional_text")]
    pub pick_up_date: Option<String>,
    #[serde(rename = "returnDate", default, deserialize_with = "optional_text")]
    pub return_date: Option<String>,
    #[serde(rename = "collectionAppointment", default, deserialize_with = "optional_text")]
    pub collection_appointment: Option<String>,
    #[serde(rename = "returnAppointment", default, deserialize_with = "optional_text")]
    pub return_appointment: Option<String>,
    #[serde(rename = "collectionAgreed", default, deserialize_with = "agreed_flag")]
    pub collection_agreed: bool,
    #[serde(rename = "returnAgreed", default, deserialize_with = "agreed_flag")]
    pub return_agreed: bool,
    #[serde(rename = "boxCalID", default, deserialize_with = "optional_text")]
    pub box_cal_id: Option<String>,
    #[serde(rename = "collectCalendarID", default, deserialize_with = "optional_text")]
    pub collect_calendar_id: Option<String>,
    #[serde(rename = "returnCalendarID", default, deserialize_with = "optional_text")]
    pub return_calendar_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub car: String,
    #[serde(rename = "box", default, deserialize_with = "loose_text")]
    pub box_name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub price: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub contact: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub phone: String,
    #[serde(rename = "googleCalendarId", default, deserialize_with = "optional_text")]
    pub google_calendar_id: Option<String>,
}

impl Booking {
    pub fn status(&self) -> Result<BookingStatus, Error> {
        self.status.parse()
    }

    /// Event identifiers the caller already holds for this booking.
    pub fn event_ids(&self) -> EventIds {
        EventIds {
            box_event: self.box_cal_id.clone(),
            collection: self.collect_calendar_id.clone(),
            return_event: self.return_calendar_id.clone(),
        }
    }
}

/// Accept strings, numbers and booleans; null becomes empty.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = loose_text(deserializer)?;
    Ok(Some(text).filter(|t| !t.is_empty()))
}

/// The booking app marks agreement with a literal "Y".
fn agreed_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_text(deserializer)? == "Y")
}

/// Calendar event ids belonging to one booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventIds {
    #[serde(rename = "boxCalID", serialize_with = "empty_if_absent")]
    pub box_event: Option<String>,
    #[serde(rename = "collectCalendarID", serialize_with = "empty_if_absent")]
    pub collection: Option<String>,
    #[serde(rename = "returnCalendarID", serialize_with = "empty_if_absent")]
    pub return_event: Option<String>,
}

fn empty_if_absent<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// Body returned after a successful sync.
#[derive(Debug, Serialize)]
pub struct SyncedResponse {
    #[serde(rename = "rowId")]
    pub row_id: serde_json::Value,
    #[serde(flatten)]
    pub event_ids: EventIds,
}

/// Message-only body (ignored status, rejected source).
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Outcome of one best-effort delete during cancellation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionOutcome {
    /// Booking field the id came from
    pub field: &'static str,
    pub event_id: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body returned after a cancellation.
#[derive(Debug, Serialize)]
pub struct CancelledResponse {
    #[serde(rename = "rowId")]
    pub row_id: serde_json::Value,
    pub message: String,
    #[serde(flatten)]
    pub event_ids: EventIds,
    pub deletions: Vec<DeletionOutcome>,
}

/// Body returned for any failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
    /// Ids already written before a calendar call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<EventIds>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert_eq!("On Loan".parse::<BookingStatus>().unwrap(), BookingStatus::OnLoan);
        assert_eq!(" Returned ".parse::<BookingStatus>().unwrap(), BookingStatus::Returned);
        assert_eq!("Archived".parse::<BookingStatus>().unwrap(), BookingStatus::Archived);
        assert_eq!("Cancelled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("Pending".parse::<BookingStatus>().is_err());
        assert!("confirmed".parse::<BookingStatus>().is_err());
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_color_mapping() {
        assert_eq!(BookingStatus::Confirmed.color_id(), "10");
        assert_eq!(BookingStatus::OnLoan.color_id(), "11");
        assert_eq!(BookingStatus::Returned.color_id(), "8");
        assert_eq!(BookingStatus::Archived.color_id(), "1");
    }

    #[test]
    fn test_booking_deserialization() {
        let json = r#"{
            "rowId": 42,
            "status": "On Loan",
            "pickUpDate": "01/01/2025",
            "returnDate": "05/01/2025",
            "collectionAppointment": "01/01/2025 09:00:00",
            "returnAppointment": "",
            "collectionAgreed": "Y",
            "returnAgreed": "N",
            "boxCalID": "abc123",
            "collectCalendarID": null,
            "returnCalendarID": "   ",
            "car": "Volvo XC90",
            "box": "Thule Motion 800",
            "price": 85.5,
            "contact": "Sam Taylor",
            "phone": "07700 900123"
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.row_id, serde_json::json!(42));
        assert_eq!(booking.status().unwrap(), BookingStatus::OnLoan);
        assert!(booking.collection_agreed);
        assert!(!booking.return_agreed);
        assert_eq!(booking.return_appointment, None);
        assert_eq!(booking.box_cal_id.as_deref(), Some("abc123"));
        assert_eq!(booking.collect_calendar_id, None);
        assert_eq!(booking.return_calendar_id, None);
        assert_eq!(booking.box_name, "Thule Motion 800");
        assert_eq!(booking.price, "85.5");
        assert_eq!(booking.google_calendar_id, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let booking: Booking = serde_json::from_str(r#"{"status": "Confirmed"}"#).unwrap();
        assert!(booking.row_id.is_null());
        assert!(!booking.collection_agreed);
        assert_eq!(booking.event_ids(), EventIds::default());
    }

    #[test]
    fn test_agreed_flag_is_literal_y() {
        let booking: Booking =
            serde_json::from_str(r#"{"collectionAgreed": "y", "returnAgreed": "Yes"}"#).unwrap();
        assert!(!booking.collection_agreed);
        assert!(!booking.return_agreed);
    }

    #[test]
    fn test_responses_use_empty_strings_for_absent_ids() {
        let response = SyncedResponse {
            row_id: serde_json::json!("row-7"),
            event_ids: EventIds {
                box_event: Some("box-1".to_string()),
                collection: Some("col-1".to_string()),
                return_event: None,
            },
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "rowId": "row-7",
                "boxCalID": "box-1",
                "collectCalendarID": "col-1",
                "returnCalendarID": ""
            })
        );
    }
}
