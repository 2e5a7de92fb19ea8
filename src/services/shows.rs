use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::database::{Database, Show};
use crate::error::{BookingError, BookingResult, EntityKind};
use crate::forms::ShowForm;
use crate::repository::{self, Counterpart};
use crate::services::in_transaction;

/// Display layout for show start times: `DD/MM/YYYY, HH:MM`, 24-hour clock.
pub const START_TIME_DISPLAY: &str = "%d/%m/%Y, %H:%M";

pub fn format_start_time(start_time: NaiveDateTime) -> String {
    start_time.format(START_TIME_DISPLAY).to_string()
}

/// Shows split around a reference instant. Both sides keep storage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionedShows<T> {
    pub past: Vec<T>,
    pub upcoming: Vec<T>,
}

impl<T> PartitionedShows<T> {
    pub fn map<U>(self, f: impl Fn(T) -> U) -> PartitionedShows<U> {
        PartitionedShows {
            past: self.past.into_iter().map(&f).collect(),
            upcoming: self.upcoming.into_iter().map(&f).collect(),
        }
    }
}

/// Split `shows` into past (`start_time <= now`) and upcoming (`start_time > now`).
pub fn partition<T>(
    shows: impl IntoIterator<Item = (NaiveDateTime, T)>,
    now: NaiveDateTime,
) -> PartitionedShows<T> {
    let mut past = Vec::new();
    let mut upcoming = Vec::new();

    for (start_time, show) in shows {
        if start_time > now {
            upcoming.push(show);
        } else {
            past.push(show);
        }
    }

    PartitionedShows { past, upcoming }
}

/// A show seen from one side, denormalized with the other side's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowSlot {
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub counterpart_image_link: String,
    pub start_time: String,
}

/// One row of the show listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Past and upcoming shows of a venue (or artist) relative to `now`.
    ///
    /// A show whose counterpart no longer resolves is a referential fault.
    pub async fn partition_for(
        &self,
        kind: EntityKind,
        id: i64,
        now: NaiveDateTime,
    ) -> BookingResult<PartitionedShows<ShowSlot>> {
        let rows = repository::shows_with_counterparts(&self.db.conn, kind, id).await?;
        let counterpart_kind = other_side(kind);

        let mut slots = Vec::with_capacity(rows.len());
        for (show, counterpart) in rows {
            let counterpart = counterpart.ok_or_else(|| {
                let counterpart_id = match counterpart_kind {
                    EntityKind::Venue => show.venue_id,
                    EntityKind::Artist => show.artist_id,
                };
                log::error!(
                    "Show {} of {kind} {id} references missing {counterpart_kind} {counterpart_id}",
                    show.id
                );
                BookingError::Referential {
                    kind: counterpart_kind,
                    id: counterpart_id,
                }
            })?;
            slots.push((show.start_time, slot(counterpart, show.start_time)));
        }

        Ok(partition(slots, now))
    }

    /// Upcoming show counts for the venues (or artists) in `ids`, in one query.
    /// An id with no upcoming shows is absent from the map.
    pub async fn count_upcoming(
        &self,
        kind: EntityKind,
        ids: Vec<i64>,
        now: NaiveDateTime,
    ) -> BookingResult<HashMap<i64, u64>> {
        repository::upcoming_counts(&self.db.conn, kind, ids, now).await
    }

    /// Every show in storage order with venue and artist resolved.
    pub async fn list_shows(&self) -> BookingResult<Vec<ShowListing>> {
        let shows = repository::find_all_shows(&self.db.conn).await?;

        let venue_ids = shows.iter().map(|s| s.venue_id).collect();
        let artist_ids = shows.iter().map(|s| s.artist_id).collect();
        let venues = repository::counterparts(&self.db.conn, EntityKind::Venue, venue_ids).await?;
        let artists =
            repository::counterparts(&self.db.conn, EntityKind::Artist, artist_ids).await?;

        shows
            .into_iter()
            .map(|show| {
                let venue = venues.get(&show.venue_id).ok_or(BookingError::Referential {
                    kind: EntityKind::Venue,
                    id: show.venue_id,
                })?;
                let artist = artists
                    .get(&show.artist_id)
                    .ok_or(BookingError::Referential {
                        kind: EntityKind::Artist,
                        id: show.artist_id,
                    })?;

                Ok(ShowListing {
                    venue_id: venue.id,
                    venue_name: venue.name.clone(),
                    artist_id: artist.id,
                    artist_name: artist.name.clone(),
                    artist_image_link: artist.image_link.clone(),
                    start_time: format_start_time(show.start_time),
                })
            })
            .collect()
    }

    /// Schedule a show. Both referenced records must exist.
    pub async fn create(&self, form: ShowForm) -> BookingResult<Show> {
        let new_show = form.into_new_show()?;

        let show = in_transaction(&self.db, "show create", move |txn| {
            Box::pin(async move {
                if repository::find_venue(txn, new_show.venue_id).await?.is_none() {
                    return Err(BookingError::Referential {
                        kind: EntityKind::Venue,
                        id: new_show.venue_id,
                    });
                }
                if repository::find_artist(txn, new_show.artist_id)
                    .await?
                    .is_none()
                {
                    return Err(BookingError::Referential {
                        kind: EntityKind::Artist,
                        id: new_show.artist_id,
                    });
                }

                repository::insert_show(txn, new_show).await
            })
        })
        .await?;

        log::info!(
            "Show created: venue {} / artist {} at {} (ID: {})",
            show.venue_id,
            show.artist_id,
            show.start_time,
            show.id
        );
        Ok(show)
    }
}

fn other_side(kind: EntityKind) -> EntityKind {
    match kind {
        EntityKind::Venue => EntityKind::Artist,
        EntityKind::Artist => EntityKind::Venue,
    }
}

fn slot(counterpart: Counterpart, start_time: NaiveDateTime) -> ShowSlot {
    ShowSlot {
        counterpart_id: counterpart.id,
        counterpart_name: counterpart.name,
        counterpart_image_link: counterpart.image_link,
        start_time: format_start_time(start_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{ConnectionTrait, EntityTrait};
    use crate::entities;
    use crate::test_utils::{at, insert_artist, insert_show, insert_venue, test_db};

    #[test]
    fn test_format_start_time() {
        assert_eq!(format_start_time(at(2019, 5, 21, 21, 30)), "21/05/2019, 21:30");
        assert_eq!(format_start_time(at(2035, 1, 2, 3, 4)), "02/01/2035, 03:04");
    }

    #[test]
    fn test_partition_boundary_is_past() {
        let now = at(2024, 5, 1, 20, 0);
        let shows = vec![
            (now - Duration::hours(1), "before"),
            (now, "exactly"),
            (now + Duration::seconds(1), "after"),
        ];

        let split = partition(shows, now);
        assert_eq!(split.past, vec!["before", "exactly"]);
        assert_eq!(split.upcoming, vec!["after"]);
    }

    #[test]
    fn test_partition_keeps_input_order() {
        let now = at(2024, 5, 1, 20, 0);
        let shows = vec![
            (at(2030, 1, 1, 0, 0), 1),
            (at(2010, 1, 1, 0, 0), 2),
            (at(2025, 1, 1, 0, 0), 3),
            (at(2000, 1, 1, 0, 0), 4),
        ];

        let split = partition(shows, now);
        assert_eq!(split.upcoming, vec![1, 3]);
        assert_eq!(split.past, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_partition_for_venue_and_artist_at_boundary() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop", "San Francisco", "CA").await;
        let artist = insert_artist(&db, "Guns N Petals").await;
        let now = at(2024, 5, 1, 20, 0);
        insert_show(&db, &venue, &artist, now).await;

        let service = ShowService::new(db);
        for (kind, id) in [(EntityKind::Venue, venue.id), (EntityKind::Artist, artist.id)] {
            let split = service.partition_for(kind, id, now).await.unwrap();
            assert_eq!(split.past.len(), 1);
            assert!(split.upcoming.is_empty());
            let counts = service.count_upcoming(kind, vec![id], now).await.unwrap();
            assert!(counts.is_empty());
        }
    }

    #[tokio::test]
    async fn test_partition_for_venue_denormalizes_artist() {
        let db = test_db().await;
        let venue = insert_venue(&db, "Park Square", "San Francisco", "CA").await;
        let artist = insert_artist(&db, "The Wild Sax Band").await;
        let now = at(2024, 5, 1, 20, 0);
        insert_show(&db, &venue, &artist, at(2035, 4, 1, 20, 0)).await;

        let split = ShowService::new(db)
            .partition_for(EntityKind::Venue, venue.id, now)
            .await
            .unwrap();

        assert_eq!(
            split.upcoming,
            vec![ShowSlot {
                counterpart_id: artist.id,
                counterpart_name: "The Wild Sax Band".into(),
                counterpart_image_link: artist.image_link.clone(),
                start_time: "01/04/2035, 20:00".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_list_shows_in_storage_order() {
        let db = test_db().await;
        let hop = insert_venue(&db, "The Musical Hop", "San Francisco", "CA").await;
        let park = insert_venue(&db, "Park Square", "San Francisco", "CA").await;
        let petals = insert_artist(&db, "Guns N Petals").await;
        let sax = insert_artist(&db, "The Wild Sax Band").await;
        insert_show(&db, &park, &sax, at(2035, 4, 1, 20, 0)).await;
        insert_show(&db, &hop, &petals, at(2019, 5, 21, 21, 30)).await;

        let listing = ShowService::new(db).list_shows().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].venue_name, "Park Square");
        assert_eq!(listing[0].artist_name, "The Wild Sax Band");
        assert_eq!(listing[1].venue_id, hop.id);
        assert_eq!(listing[1].artist_image_link, petals.image_link);
        assert_eq!(listing[1].start_time, "21/05/2019, 21:30");
    }

    #[tokio::test]
    async fn test_create_show() {
        let db = test_db().await;
        let venue = insert_venue(&db, "Venue", "NYC", "NY").await;
        let artist = insert_artist(&db, "Artist").await;
        let service = ShowService::new(db);

        let show = service
            .create(ShowForm {
                venue_id: venue.id.to_string(),
                artist_id: artist.id.to_string(),
                start_time: "2035-04-08 20:00:00".into(),
            })
            .await
            .unwrap();

        assert_eq!(show.venue_id, venue.id);
        assert_eq!(show.start_time, at(2035, 4, 8, 20, 0));
        assert_eq!(service.list_shows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_show_with_missing_artist_is_referential_fault() {
        let db = test_db().await;
        let venue = insert_venue(&db, "Venue", "NYC", "NY").await;
        let service = ShowService::new(db);

        let err = service
            .create(ShowForm {
                venue_id: venue.id.to_string(),
                artist_id: "404".into(),
                start_time: "2035-04-08 20:00:00".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::Referential {
                kind: EntityKind::Artist,
                id: 404
            }
        ));
        assert!(service.list_shows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_fail_loudly_on_missing_counterpart() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop", "San Francisco", "CA").await;
        let artist = insert_artist(&db, "Guns N Petals").await;
        insert_show(&db, &venue, &artist, at(2035, 4, 1, 20, 0)).await;

        // Leave the show dangling behind the store's back
        db.conn
            .execute_unprepared("PRAGMA foreign_keys = OFF")
            .await
            .unwrap();
        entities::artist::Entity::delete_by_id(artist.id)
            .exec(&db.conn)
            .await
            .unwrap();

        let service = ShowService::new(db);
        let missing_artist = |result: BookingResult<_>| {
            matches!(
                result,
                Err(BookingError::Referential {
                    kind: EntityKind::Artist,
                    id
                }) if id == artist.id
            )
        };

        assert!(missing_artist(
            service
                .partition_for(EntityKind::Venue, venue.id, at(2024, 5, 1, 20, 0))
                .await
                .map(|_| ())
        ));
        assert!(missing_artist(service.list_shows().await.map(|_| ())));
    }
}
