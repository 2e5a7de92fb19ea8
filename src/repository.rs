//! Repository operations over the Entity Store.
//!
//! Every function is generic over the connection so the same code runs on the
//! pooled connection for reads and inside a transaction for mutations.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ActiveValue::Unchanged,
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::database::{Artist, NewArtist, NewShow, NewVenue, Show, Venue};
use crate::entities;
use crate::error::{BookingError, BookingResult, EntityKind};
use crate::genres;

/// The other side of a show: the artist for a venue, the venue for an artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterpart {
    pub id: i64,
    pub name: String,
    pub image_link: String,
}

impl From<entities::venue::Model> for Counterpart {
    fn from(model: entities::venue::Model) -> Self {
        Counterpart {
            id: model.id,
            name: model.name,
            image_link: model.image_link,
        }
    }
}

impl From<entities::artist::Model> for Counterpart {
    fn from(model: entities::artist::Model) -> Self {
        Counterpart {
            id: model.id,
            name: model.name,
            image_link: model.image_link,
        }
    }
}

/// `(id, name)` of every venue (or artist), ordered by id.
///
/// Only the two columns are read, so a corrupted genre field elsewhere in the
/// row does not break name lookups.
pub async fn names<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
) -> BookingResult<Vec<(i64, String)>> {
    let names: Vec<(i64, String)> = match kind {
        EntityKind::Venue => {
            entities::venue::Entity::find()
                .select_only()
                .column(entities::venue::Column::Id)
                .column(entities::venue::Column::Name)
                .order_by_asc(entities::venue::Column::Id)
                .into_tuple()
                .all(conn)
                .await?
        }
        EntityKind::Artist => {
            entities::artist::Entity::find()
                .select_only()
                .column(entities::artist::Column::Id)
                .column(entities::artist::Column::Name)
                .order_by_asc(entities::artist::Column::Id)
                .into_tuple()
                .all(conn)
                .await?
        }
    };

    Ok(names)
}

// ========== Venue Methods ==========

pub async fn find_venue<C: ConnectionTrait>(conn: &C, id: i64) -> BookingResult<Option<Venue>> {
    let model = entities::venue::Entity::find_by_id(id).one(conn).await?;
    Ok(model.map(Venue::try_from).transpose()?)
}

pub async fn find_all_venues<C: ConnectionTrait>(conn: &C) -> BookingResult<Vec<Venue>> {
    find_venues_where(conn, Condition::all()).await
}

/// Venues matching `condition`, ordered by id.
pub async fn find_venues_where<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> BookingResult<Vec<Venue>> {
    let models = entities::venue::Entity::find()
        .filter(condition)
        .order_by_asc(entities::venue::Column::Id)
        .all(conn)
        .await?;

    models
        .into_iter()
        .map(|model| Venue::try_from(model).map_err(BookingError::from))
        .collect()
}

pub async fn insert_venue<C: ConnectionTrait>(conn: &C, venue: NewVenue) -> BookingResult<Venue> {
    let model = entities::venue::ActiveModel {
        id: NotSet,
        name: Set(venue.name),
        genres: Set(genres::encode(&venue.genres)),
        city: Set(venue.city),
        state: Set(venue.state),
        address: Set(venue.address),
        website: Set(venue.website),
        phone: Set(venue.phone),
        image_link: Set(venue.image_link),
        facebook_link: Set(venue.facebook_link),
        seeking_talent: Set(venue.seeking_talent),
        seeking_description: Set(venue.seeking_description),
    }
    .insert(conn)
    .await?;

    Ok(Venue::try_from(model)?)
}

/// Overwrite every column of an existing venue.
pub async fn update_venue<C: ConnectionTrait>(conn: &C, venue: &Venue) -> BookingResult<Venue> {
    let model = entities::venue::ActiveModel {
        id: Unchanged(venue.id),
        name: Set(venue.name.clone()),
        genres: Set(genres::encode(&venue.genres)),
        city: Set(venue.city.clone()),
        state: Set(venue.state.clone()),
        address: Set(venue.address.clone()),
        website: Set(venue.website.clone()),
        phone: Set(venue.phone.clone()),
        image_link: Set(venue.image_link.clone()),
        facebook_link: Set(venue.facebook_link.clone()),
        seeking_talent: Set(venue.seeking_talent),
        seeking_description: Set(venue.seeking_description.clone()),
    }
    .update(conn)
    .await?;

    Ok(Venue::try_from(model)?)
}

/// Delete a venue together with its shows. Returns how many shows went with it.
pub async fn delete_venue<C: ConnectionTrait>(conn: &C, id: i64) -> BookingResult<u64> {
    let shows = entities::show::Entity::delete_many()
        .filter(entities::show::Column::VenueId.eq(id))
        .exec(conn)
        .await?;

    let deleted = entities::venue::Entity::delete_by_id(id).exec(conn).await?;
    if deleted.rows_affected == 0 {
        return Err(BookingError::Referential {
            kind: EntityKind::Venue,
            id,
        });
    }

    Ok(shows.rows_affected)
}

// ========== Artist Methods ==========

pub async fn find_artist<C: ConnectionTrait>(conn: &C, id: i64) -> BookingResult<Option<Artist>> {
    let model = entities::artist::Entity::find_by_id(id).one(conn).await?;
    Ok(model.map(Artist::try_from).transpose()?)
}

pub async fn find_all_artists<C: ConnectionTrait>(conn: &C) -> BookingResult<Vec<Artist>> {
    find_artists_where(conn, Condition::all()).await
}

/// Artists matching `condition`, ordered by id.
pub async fn find_artists_where<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> BookingResult<Vec<Artist>> {
    let models = entities::artist::Entity::find()
        .filter(condition)
        .order_by_asc(entities::artist::Column::Id)
        .all(conn)
        .await?;

    models
        .into_iter()
        .map(|model| Artist::try_from(model).map_err(BookingError::from))
        .collect()
}

pub async fn insert_artist<C: ConnectionTrait>(
    conn: &C,
    artist: NewArtist,
) -> BookingResult<Artist> {
    let model = entities::artist::ActiveModel {
        id: NotSet,
        name: Set(artist.name),
        city: Set(artist.city),
        state: Set(artist.state),
        phone: Set(artist.phone),
        genres: Set(genres::encode(&artist.genres)),
        image_link: Set(artist.image_link),
        facebook_link: Set(artist.facebook_link),
        website: Set(artist.website),
        seeking_venue: Set(artist.seeking_venue),
        seeking_description: Set(artist.seeking_description),
    }
    .insert(conn)
    .await?;

    Ok(Artist::try_from(model)?)
}

/// Overwrite every column of an existing artist.
pub async fn update_artist<C: ConnectionTrait>(
    conn: &C,
    artist: &Artist,
) -> BookingResult<Artist> {
    let model = entities::artist::ActiveModel {
        id: Unchanged(artist.id),
        name: Set(artist.name.clone()),
        city: Set(artist.city.clone()),
        state: Set(artist.state.clone()),
        phone: Set(artist.phone.clone()),
        genres: Set(genres::encode(&artist.genres)),
        image_link: Set(artist.image_link.clone()),
        facebook_link: Set(artist.facebook_link.clone()),
        website: Set(artist.website.clone()),
        seeking_venue: Set(artist.seeking_venue),
        seeking_description: Set(artist.seeking_description.clone()),
    }
    .update(conn)
    .await?;

    Ok(Artist::try_from(model)?)
}

/// Delete an artist together with its shows. Returns how many shows went with it.
pub async fn delete_artist<C: ConnectionTrait>(conn: &C, id: i64) -> BookingResult<u64> {
    let shows = entities::show::Entity::delete_many()
        .filter(entities::show::Column::ArtistId.eq(id))
        .exec(conn)
        .await?;

    let deleted = entities::artist::Entity::delete_by_id(id).exec(conn).await?;
    if deleted.rows_affected == 0 {
        return Err(BookingError::Referential {
            kind: EntityKind::Artist,
            id,
        });
    }

    Ok(shows.rows_affected)
}

// ========== Show Methods ==========

pub async fn find_all_shows<C: ConnectionTrait>(conn: &C) -> BookingResult<Vec<Show>> {
    find_shows_where(conn, Condition::all()).await
}

/// Shows matching `condition`, in storage (id) order.
pub async fn find_shows_where<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> BookingResult<Vec<Show>> {
    let models = entities::show::Entity::find()
        .filter(condition)
        .order_by_asc(entities::show::Column::Id)
        .all(conn)
        .await?;

    Ok(models.into_iter().map(Show::from).collect())
}

pub async fn insert_show<C: ConnectionTrait>(conn: &C, show: NewShow) -> BookingResult<Show> {
    let model = entities::show::ActiveModel {
        id: NotSet,
        venue_id: Set(show.venue_id),
        artist_id: Set(show.artist_id),
        start_time: Set(show.start_time),
    }
    .insert(conn)
    .await?;

    Ok(Show::from(model))
}

/// Shows of a venue or artist, each with its resolved counterpart, in storage
/// order. A `None` counterpart means the show points at a missing record.
pub async fn shows_with_counterparts<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: i64,
) -> BookingResult<Vec<(Show, Option<Counterpart>)>> {
    let shows = entities::show::Entity::find()
        .filter(owner_column(kind).eq(id))
        .order_by_asc(entities::show::Column::Id);

    let rows = match kind {
        EntityKind::Venue => shows
            .find_also_related(entities::artist::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(show, artist)| (Show::from(show), artist.map(Counterpart::from)))
            .collect(),
        EntityKind::Artist => shows
            .find_also_related(entities::venue::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(show, venue)| (Show::from(show), venue.map(Counterpart::from)))
            .collect(),
    };

    Ok(rows)
}

/// Venues (or artists) with the given ids, keyed by id. Missing ids are absent.
pub async fn counterparts<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: Vec<i64>,
) -> BookingResult<HashMap<i64, Counterpart>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let found: Vec<Counterpart> = match kind {
        EntityKind::Venue => entities::venue::Entity::find()
            .filter(entities::venue::Column::Id.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(Counterpart::from)
            .collect(),
        EntityKind::Artist => entities::artist::Entity::find()
            .filter(entities::artist::Column::Id.is_in(ids))
            .all(conn)
            .await?
            .into_iter()
            .map(Counterpart::from)
            .collect(),
    };

    Ok(found.into_iter().map(|c| (c.id, c)).collect())
}

/// Shows starting strictly after `now`, counted per venue (or artist) in
/// `ids`. Ids without upcoming shows are absent from the map.
pub async fn upcoming_counts<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    ids: Vec<i64>,
    now: NaiveDateTime,
) -> BookingResult<HashMap<i64, u64>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let owner = owner_column(kind);
    let rows: Vec<(i64, i64)> = entities::show::Entity::find()
        .select_only()
        .column(owner)
        .column_as(SimpleExpr::from(Func::count(Expr::col(entities::show::Column::Id))), "upcoming")
        .filter(owner.is_in(ids))
        .filter(entities::show::Column::StartTime.gt(now))
        .group_by(owner)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

fn owner_column(kind: EntityKind) -> entities::show::Column {
    match kind {
        EntityKind::Venue => entities::show::Column::VenueId,
        EntityKind::Artist => entities::show::Column::ArtistId,
    }
}
