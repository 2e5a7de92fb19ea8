use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::database::{Artist, Database};
use crate::error::{BookingError, BookingResult, EntityKind};
use crate::forms::ArtistForm;
use crate::repository;
use crate::services::in_transaction;
use crate::services::shows::{ShowService, ShowSlot};

/// A show on an artist page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueAppearance {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: String,
    pub start_time: String,
}

impl From<ShowSlot> for VenueAppearance {
    fn from(slot: ShowSlot) -> Self {
        VenueAppearance {
            venue_id: slot.counterpart_id,
            venue_name: slot.counterpart_name,
            venue_image_link: slot.counterpart_image_link,
            start_time: slot.start_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
    #[serde(flatten)]
    pub artist: Artist,
    pub past_shows: Vec<VenueAppearance>,
    pub upcoming_shows: Vec<VenueAppearance>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub struct ArtistService {
    db: Arc<Database>,
    shows: ShowService,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            shows: ShowService::new(db.clone()),
            db,
        }
    }

    pub async fn get(&self, id: i64) -> BookingResult<Artist> {
        repository::find_artist(&self.db.conn, id)
            .await?
            .ok_or(BookingError::NotFound {
                kind: EntityKind::Artist,
                id,
            })
    }

    pub async fn detail(&self, id: i64, now: NaiveDateTime) -> BookingResult<ArtistDetail> {
        let artist = self.get(id).await?;
        let shows = self
            .shows
            .partition_for(EntityKind::Artist, id, now)
            .await?
            .map(VenueAppearance::from);

        Ok(ArtistDetail {
            artist,
            past_shows_count: shows.past.len(),
            upcoming_shows_count: shows.upcoming.len(),
            past_shows: shows.past,
            upcoming_shows: shows.upcoming,
        })
    }

    pub async fn create(&self, form: ArtistForm) -> BookingResult<Artist> {
        let new_artist = form.into_new_artist()?;

        let artist = in_transaction(&self.db, "artist create", move |txn| {
            Box::pin(async move { repository::insert_artist(txn, new_artist).await })
        })
        .await?;

        log::info!("Artist created: '{}' (ID: {})", artist.name, artist.id);
        Ok(artist)
    }

    /// Partial update: only non-empty submitted fields overwrite.
    pub async fn edit(&self, id: i64, form: ArtistForm) -> BookingResult<Artist> {
        let artist = in_transaction(&self.db, "artist edit", move |txn| {
            Box::pin(async move {
                let mut artist =
                    repository::find_artist(txn, id)
                        .await?
                        .ok_or(BookingError::Referential {
                            kind: EntityKind::Artist,
                            id,
                        })?;
                form.apply_to(&mut artist);
                repository::update_artist(txn, &artist).await
            })
        })
        .await?;

        log::info!("Artist updated: '{}' (ID: {})", artist.name, artist.id);
        Ok(artist)
    }

    pub async fn delete(&self, id: i64) -> BookingResult<u64> {
        let removed_shows = in_transaction(&self.db, "artist delete", move |txn| {
            Box::pin(async move { repository::delete_artist(txn, id).await })
        })
        .await?;

        log::info!("Artist deleted (ID: {id}), removed {removed_shows} shows");
        Ok(removed_shows)
    }
}
