use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::database::Database;
use crate::error::{BookingResult, EntityKind};
use crate::repository;
use crate::services::shows::ShowService;

/// A venue or artist with its upcoming show count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

/// Venues sharing one (city, state) pair, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<EntitySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<EntitySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistListItem {
    pub id: i64,
    pub name: String,
}

pub struct ListingService {
    db: Arc<Database>,
    shows: ShowService,
}

impl ListingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            shows: ShowService::new(db.clone()),
            db,
        }
    }

    /// Group all venues by (city, state).
    ///
    /// Groups appear in the order their first venue (by id) is discovered.
    pub async fn group_venues_by_location(
        &self,
        now: NaiveDateTime,
    ) -> BookingResult<Vec<LocationGroup>> {
        let venues = repository::find_all_venues(&self.db.conn).await?;
        let ids = venues.iter().map(|v| v.id).collect();
        let counts = self
            .shows
            .count_upcoming(EntityKind::Venue, ids, now)
            .await?;

        let mut groups: Vec<LocationGroup> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for venue in venues {
            let key = (venue.city.clone(), venue.state.clone());
            let position = *index.entry(key).or_insert_with(|| {
                groups.push(LocationGroup {
                    city: venue.city.clone(),
                    state: venue.state.clone(),
                    venues: Vec::new(),
                });
                groups.len() - 1
            });

            groups[position].venues.push(EntitySummary {
                num_upcoming_shows: counts.get(&venue.id).copied().unwrap_or(0),
                id: venue.id,
                name: venue.name,
            });
        }

        log::debug!("Grouped venues into {} locations", groups.len());
        Ok(groups)
    }

    /// Case-insensitive literal substring search on names, ordered by id.
    ///
    /// Case folding is Unicode-aware, so `"MÚSICA"` finds `"Música Latina"`.
    pub async fn search_by_name(
        &self,
        kind: EntityKind,
        term: &str,
        now: NaiveDateTime,
    ) -> BookingResult<SearchResults> {
        let needle = term.to_lowercase();
        let matches: Vec<(i64, String)> = repository::names(&self.db.conn, kind)
            .await?
            .into_iter()
            .filter(|(_, name)| name.to_lowercase().contains(&needle))
            .collect();

        let ids = matches.iter().map(|(id, _)| *id).collect();
        let counts = self.shows.count_upcoming(kind, ids, now).await?;
        let data: Vec<EntitySummary> = matches
            .into_iter()
            .map(|(id, name)| EntitySummary {
                num_upcoming_shows: counts.get(&id).copied().unwrap_or(0),
                id,
                name,
            })
            .collect();

        log::debug!("{kind} search {term:?} matched {} records", data.len());
        Ok(SearchResults {
            count: data.len(),
            data,
        })
    }

    /// Every artist as `{id, name}`, ordered by id.
    pub async fn list_artists(&self) -> BookingResult<Vec<ArtistListItem>> {
        let artists = repository::find_all_artists(&self.db.conn).await?;

        Ok(artists
            .into_iter()
            .map(|a| ArtistListItem {
                id: a.id,
                name: a.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::test_utils::{at, insert_artist, insert_show, insert_venue, test_db};

    #[tokio::test]
    async fn test_group_venues_by_location() {
        let db = test_db().await;
        let first = insert_venue(&db, "The Musical Hop", "NYC", "NY").await;
        let third = insert_venue(&db, "Park Square", "LA", "CA").await;
        let second = insert_venue(&db, "The Dueling Pianos Bar", "NYC", "NY").await;

        let groups = ListingService::new(db)
            .group_venues_by_location(at(2024, 5, 1, 20, 0))
            .await
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].city.as_str(), groups[0].state.as_str()), ("NYC", "NY"));
        let nyc: Vec<i64> = groups[0].venues.iter().map(|v| v.id).collect();
        assert_eq!(nyc, vec![first.id, second.id]);
        assert_eq!((groups[1].city.as_str(), groups[1].state.as_str()), ("LA", "CA"));
        assert_eq!(groups[1].venues.len(), 1);
        assert_eq!(groups[1].venues[0].id, third.id);
    }

    #[tokio::test]
    async fn test_same_city_different_state_is_a_separate_group() {
        let db = test_db().await;
        insert_venue(&db, "Portland Maine", "Portland", "ME").await;
        insert_venue(&db, "Portland Oregon", "Portland", "OR").await;

        let groups = ListingService::new(db)
            .group_venues_by_location(at(2024, 5, 1, 20, 0))
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn test_group_annotates_upcoming_counts() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop", "NYC", "NY").await;
        let artist = insert_artist(&db, "Guns N Petals").await;
        let now = at(2024, 5, 1, 20, 0);
        insert_show(&db, &venue, &artist, now + Duration::days(3)).await;
        insert_show(&db, &venue, &artist, now + Duration::days(4)).await;
        insert_show(&db, &venue, &artist, now - Duration::days(4)).await;

        let groups = ListingService::new(db)
            .group_venues_by_location(now)
            .await
            .unwrap();
        assert_eq!(groups[0].venues[0].num_upcoming_shows, 2);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = test_db().await;
        let trio = insert_artist(&db, "Jazz Trio").await;
        insert_artist(&db, "Guns N Petals").await;
        let service = ListingService::new(db);
        let now = at(2024, 5, 1, 20, 0);

        for term in ["jazz", "JAZZ", "z t"] {
            let results = service
                .search_by_name(EntityKind::Artist, term, now)
                .await
                .unwrap();
            assert_eq!(results.count, 1, "term {term:?}");
            assert_eq!(results.data[0].id, trio.id);
        }
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = test_db().await;
        let musica = insert_artist(&db, "Música Latina").await;
        let ecole = insert_artist(&db, "ÉCOLE").await;
        insert_artist(&db, "Musica Plain").await;
        let service = ListingService::new(db);
        let now = at(2024, 5, 1, 20, 0);

        let results = service
            .search_by_name(EntityKind::Artist, "MÚSICA", now)
            .await
            .unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].id, musica.id);

        let results = service
            .search_by_name(EntityKind::Artist, "école", now)
            .await
            .unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].id, ecole.id);
    }

    #[tokio::test]
    async fn test_empty_search_matches_everything_in_id_order() {
        let db = test_db().await;
        let a = insert_venue(&db, "Zebra Lounge", "NYC", "NY").await;
        let b = insert_venue(&db, "Apollo", "NYC", "NY").await;

        let results = ListingService::new(db)
            .search_by_name(EntityKind::Venue, "", at(2024, 5, 1, 20, 0))
            .await
            .unwrap();

        assert_eq!(results.count, 2);
        let ids: Vec<i64> = results.data.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_search_treats_metacharacters_literally() {
        let db = test_db().await;
        insert_venue(&db, "Hop", "NYC", "NY").await;
        let service = ListingService::new(db);
        let now = at(2024, 5, 1, 20, 0);

        for term in ["%", "_", ".*", "[a-z]", "'", "\\", "!"] {
            let results = service
                .search_by_name(EntityKind::Venue, term, now)
                .await
                .unwrap();
            assert_eq!(results.count, 0, "term {term:?}");
        }
    }

    #[tokio::test]
    async fn test_search_matches_metacharacters_as_text() {
        let db = test_db().await;
        let percent = insert_venue(&db, "100% Live", "NYC", "NY").await;
        insert_venue(&db, "1000 Live", "NYC", "NY").await;
        let underscore = insert_venue(&db, "Under_score", "NYC", "NY").await;
        insert_venue(&db, "Underscore", "NYC", "NY").await;
        let service = ListingService::new(db);
        let now = at(2024, 5, 1, 20, 0);

        let results = service
            .search_by_name(EntityKind::Venue, "100%", now)
            .await
            .unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].id, percent.id);

        let results = service
            .search_by_name(EntityKind::Venue, "r_s", now)
            .await
            .unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].id, underscore.id);
    }

    #[tokio::test]
    async fn test_search_reports_upcoming_show_count() {
        let db = test_db().await;
        let venue = insert_venue(&db, "Venue", "NYC", "NY").await;
        let artist = insert_artist(&db, "A").await;
        let now = at(2024, 5, 1, 20, 0);
        insert_show(&db, &venue, &artist, now - Duration::hours(1)).await;
        insert_show(&db, &venue, &artist, now + Duration::hours(1)).await;

        let results = ListingService::new(db)
            .search_by_name(EntityKind::Artist, "A", now)
            .await
            .unwrap();

        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].num_upcoming_shows, 1);
    }

    #[tokio::test]
    async fn test_list_artists() {
        let db = test_db().await;
        let first = insert_artist(&db, "Guns N Petals").await;
        let second = insert_artist(&db, "Matt Quevedo").await;

        let artists = ListingService::new(db).list_artists().await.unwrap();
        assert_eq!(
            artists,
            vec![
                ArtistListItem {
                    id: first.id,
                    name: "Guns N Petals".into()
                },
                ArtistListItem {
                    id: second.id,
                    name: "Matt Quevedo".into()
                },
            ]
        );
    }
}
