//! Booking to calendar reconciliation.
//!
//! A booking owns up to three calendar events: the box hire itself (an
//! all-day range from pick-up to return) plus optional collection and return
//! appointments. Each webhook delivery carries whatever event ids the booking
//! app stored from the previous delivery; the reconciler creates what is
//! missing, updates what exists and hands the ids back for the next round.

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::calendar::{CalendarClient, CalendarError, EventBody, EventTime};
use crate::dates::{localize, parse_appointment, parse_day};
use crate::models::{Booking, BookingStatus, DeletionOutcome, EventIds};
use crate::{Config, Error, Result};

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Status outside the lifecycle we track; nothing touched.
    Ignored { status: String },
    /// Booking cancelled; every known event was deleted on a best-effort basis.
    Cancelled {
        row_id: serde_json::Value,
        deletions: Vec<DeletionOutcome>,
    },
    /// Calendar now mirrors the booking.
    Synced {
        row_id: serde_json::Value,
        event_ids: EventIds,
    },
}

/// Event bodies derived from one booking snapshot, built before any call.
struct SyncPlan {
    box_event: EventBody,
    collection: Option<EventBody>,
    return_event: Option<EventBody>,
}

/// Maps booking snapshots onto calendar mutations.
#[derive(Debug, Clone)]
pub struct Reconciler {
    timezone: Tz,
    default_calendar_id: String,
    appointment_duration: chrono::Duration,
}

impl Reconciler {
    pub fn new(
        timezone: Tz,
        default_calendar_id: impl Into<String>,
        appointment_duration: chrono::Duration,
    ) -> Self {
        Self {
            timezone,
            default_calendar_id: default_calendar_id.into(),
            appointment_duration,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.timezone,
            config.default_calendar_id.clone(),
            config.appointment_duration,
        )
    }

    /// Bring the calendar in line with `booking`.
    pub async fn reconcile(
        &self,
        booking: &Booking,
        client: &dyn CalendarClient,
    ) -> Result<Reconciliation> {
        let mut ids = booking.event_ids();
        self.reconcile_into(booking, client, &mut ids).await
    }

    /// Like [`Reconciler::reconcile`], but writes each id into `ids` as soon as
    /// the calendar assigns it, so a caller that abandons the future still
    /// knows which events exist.
    pub async fn reconcile_into(
        &self,
        booking: &Booking,
        client: &dyn CalendarClient,
        ids: &mut EventIds,
    ) -> Result<Reconciliation> {
        let status = match booking.status() {
            Ok(status) => status,
            Err(_) => {
                info!("Ignoring booking with status '{}'", booking.status);
                return Ok(Reconciliation::Ignored {
                    status: booking.status.clone(),
                });
            }
        };

        let calendar_id = booking
            .google_calendar_id
            .as_deref()
            .unwrap_or(&self.default_calendar_id);

        if status == BookingStatus::Cancelled {
            let deletions = self.delete_all(booking, calendar_id, client).await;
            return Ok(Reconciliation::Cancelled {
                row_id: booking.row_id.clone(),
                deletions,
            });
        }

        let plan = self.plan(booking, status)?;
        *ids = booking.event_ids();

        let box_id = upsert(client, calendar_id, ids.box_event.as_deref(), &plan.box_event)
            .await
            .map_err(|source| Error::CalendarOperationFailed {
                partial: ids.clone(),
                source,
            })?;
        ids.box_event = Some(box_id);

        if let Some(event) = &plan.collection {
            let id = upsert(client, calendar_id, ids.collection.as_deref(), event)
                .await
                .map_err(|source| Error::CalendarOperationFailed {
                    partial: ids.clone(),
                    source,
                })?;
            ids.collection = Some(id);
        }

        if let Some(event) = &plan.return_event {
            let id = upsert(client, calendar_id, ids.return_event.as_deref(), event)
                .await
                .map_err(|source| Error::CalendarOperationFailed {
                    partial: ids.clone(),
                    source,
                })?;
            ids.return_event = Some(id);
        }

        info!(
            "Synced booking {} ({}) to calendar {}",
            booking.row_id, status, calendar_id
        );

        Ok(Reconciliation::Synced {
            row_id: booking.row_id.clone(),
            event_ids: ids.clone(),
        })
    }

    async fn delete_all(
        &self,
        booking: &Booking,
        calendar_id: &str,
        client: &dyn CalendarClient,
    ) -> Vec<DeletionOutcome> {
        let targets = [
            ("boxCalID", &booking.box_cal_id),
            ("collectCalendarID", &booking.collect_calendar_id),
            ("returnCalendarID", &booking.return_calendar_id),
        ];

        let mut outcomes = Vec::new();
        for (field, event_id) in targets {
            let Some(event_id) = event_id else {
                continue;
            };

            let outcome = match client.delete(calendar_id, event_id).await {
                Ok(()) => {
                    info!("Deleted {} event {}", field, event_id);
                    DeletionOutcome {
                        field,
                        event_id: event_id.clone(),
                        deleted: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to delete {} event {}: {}", field, event_id, e);
                    DeletionOutcome {
                        field,
                        event_id: event_id.clone(),
                        deleted: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Normalize every date the booking needs so that nothing is written if any is bad.
    fn plan(&self, booking: &Booking, status: BookingStatus) -> Result<SyncPlan> {
        let pick_up = required_day(booking.pick_up_date.as_deref(), "pickUpDate")?;
        let return_day = required_day(booking.return_date.as_deref(), "returnDate")?;
        if return_day < pick_up {
            return Err(Error::DateFormatInvalid(format!(
                "returnDate {} is before pickUpDate {}",
                return_day, pick_up
            )));
        }
        // All-day end dates are exclusive
        let end_day = return_day.succ_opt().ok_or_else(|| {
            Error::DateFormatInvalid(format!("returnDate {} is out of range", return_day))
        })?;

        let box_event = EventBody {
            summary: format!("Box Hire - {} - {}", booking.car, booking.box_name),
            description: format!(
                "Status: {}\nPrice: {}\nContact: {}\nPhone: {}",
                status, booking.price, booking.contact, booking.phone
            ),
            start: EventTime::all_day(pick_up),
            end: EventTime::all_day(end_day),
            color_id: status.color_id().to_string(),
        };

        let collection = if booking.collection_agreed {
            Some(self.appointment(
                booking,
                status,
                "Collection",
                booking.collection_appointment.as_deref(),
                "collectionAppointment",
            )?)
        } else {
            None
        };

        let return_event = if booking.return_agreed {
            Some(self.appointment(
                booking,
                status,
                "Return",
                booking.return_appointment.as_deref(),
                "returnAppointment",
            )?)
        } else {
            None
        };

        Ok(SyncPlan {
            box_event,
            collection,
            return_event,
        })
    }

    fn appointment(
        &self,
        booking: &Booking,
        status: BookingStatus,
        kind: &str,
        timestamp: Option<&str>,
        field: &str,
    ) -> Result<EventBody> {
        let timestamp = timestamp
            .ok_or_else(|| Error::DateFormatInvalid(format!("{} is missing", field)))?;
        let start = localize(parse_appointment(timestamp)?, self.timezone)?;
        let end = start + self.appointment_duration;

        Ok(EventBody {
            summary: format!(
                "{} Appointment - {} - {}",
                kind, booking.car, booking.box_name
            ),
            description: format!(
                "Status: {}\nContact: {}\nPhone: {}",
                status, booking.contact, booking.phone
            ),
            start: EventTime::at(start),
            end: EventTime::at(end),
            color_id: status.color_id().to_string(),
        })
    }
}

fn required_day(value: Option<&str>, field: &str) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| Error::DateFormatInvalid(format!("{} is missing", field)))?;
    parse_day(value)
}

/// Update `existing` in place, or create a new event when there is none.
async fn upsert(
    client: &dyn CalendarClient,
    calendar_id: &str,
    existing: Option<&str>,
    event: &EventBody,
) -> std::result::Result<String, CalendarError> {
    match existing {
        Some(event_id) => {
            info!("Updating event {} ({})", event_id, event.summary);
            client.update(calendar_id, event_id, event).await
        }
        None => {
            let event_id = client.create(calendar_id, event).await?;
            info!("Created event {} ({})", event_id, event.summary);
            Ok(event_id)
        }
    }
}
