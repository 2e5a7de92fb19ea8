use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::database::{Database, Venue};
use crate::error::{BookingError, BookingResult, EntityKind};
use crate::forms::VenueForm;
use crate::repository;
use crate::services::in_transaction;
use crate::services::shows::{ShowService, ShowSlot};

/// A show on a venue page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistAppearance {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

impl From<ShowSlot> for ArtistAppearance {
    fn from(slot: ShowSlot) -> Self {
        ArtistAppearance {
            artist_id: slot.counterpart_id,
            artist_name: slot.counterpart_name,
            artist_image_link: slot.counterpart_image_link,
            start_time: slot.start_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub past_shows: Vec<ArtistAppearance>,
    pub upcoming_shows: Vec<ArtistAppearance>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub struct VenueService {
    db: Arc<Database>,
    shows: ShowService,
}

impl VenueService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            shows: ShowService::new(db.clone()),
            db,
        }
    }

    pub async fn get(&self, id: i64) -> BookingResult<Venue> {
        repository::find_venue(&self.db.conn, id)
            .await?
            .ok_or(BookingError::NotFound {
                kind: EntityKind::Venue,
                id,
            })
    }

    /// The venue with its shows split around `now`.
    pub async fn detail(&self, id: i64, now: NaiveDateTime) -> BookingResult<VenueDetail> {
        let venue = self.get(id).await?;
        let shows = self
            .shows
            .partition_for(EntityKind::Venue, id, now)
            .await?
            .map(ArtistAppearance::from);

        Ok(VenueDetail {
            venue,
            past_shows_count: shows.past.len(),
            upcoming_shows_count: shows.upcoming.len(),
            past_shows: shows.past,
            upcoming_shows: shows.upcoming,
        })
    }

    pub async fn create(&self, form: VenueForm) -> BookingResult<Venue> {
        let new_venue = form.into_new_venue()?;

        let venue = in_transaction(&self.db, "venue create", move |txn| {
            Box::pin(async move { repository::insert_venue(txn, new_venue).await })
        })
        .await?;

        log::info!("Venue created: '{}' (ID: {})", venue.name, venue.id);
        Ok(venue)
    }

    /// Partial update: only non-empty submitted fields overwrite.
    pub async fn edit(&self, id: i64, form: VenueForm) -> BookingResult<Venue> {
        let venue = in_transaction(&self.db, "venue edit", move |txn| {
            Box::pin(async move {
                let mut venue =
                    repository::find_venue(txn, id)
                        .await?
                        .ok_or(BookingError::Referential {
                            kind: EntityKind::Venue,
                            id,
                        })?;
                form.apply_to(&mut venue);
                repository::update_venue(txn, &venue).await
            })
        })
        .await?;

        log::info!("Venue updated: '{}' (ID: {})", venue.name, venue.id);
        Ok(venue)
    }

    /// Delete the venue and, with it, every show it hosts.
    pub async fn delete(&self, id: i64) -> BookingResult<u64> {
        let removed_shows = in_transaction(&self.db, "venue delete", move |txn| {
            Box::pin(async move { repository::delete_venue(txn, id).await })
        })
        .await?;

        log::info!("Venue deleted (ID: {id}), removed {removed_shows} shows");
        Ok(removed_shows)
    }
}
