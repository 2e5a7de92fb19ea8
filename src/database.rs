use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use serde::Serialize;

use crate::entities;
use crate::genres::{self, GenreCodecError};

/// Handle on the Entity Store. Opened once on startup and closed on shutdown.
pub struct Database {
    pub(crate) conn: DatabaseConnection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub website: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Show {
    pub id: i64,
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: NaiveDateTime,
}

/// A venue that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVenue {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub website: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

/// An artist that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewArtist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShow {
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: NaiveDateTime,
}

impl TryFrom<entities::venue::Model> for Venue {
    type Error = GenreCodecError;

    fn try_from(model: entities::venue::Model) -> Result<Self, Self::Error> {
        Ok(Venue {
            genres: genres::decode(&model.genres)?,
            id: model.id,
            name: model.name,
            city: model.city,
            state: model.state,
            address: model.address,
            website: model.website,
            phone: model.phone,
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            seeking_talent: model.seeking_talent,
            seeking_description: model.seeking_description,
        })
    }
}

impl TryFrom<entities::artist::Model> for Artist {
    type Error = GenreCodecError;

    fn try_from(model: entities::artist::Model) -> Result<Self, Self::Error> {
        Ok(Artist {
            genres: genres::decode(&model.genres)?,
            id: model.id,
            name: model.name,
            city: model.city,
            state: model.state,
            phone: model.phone,
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            website: model.website,
            seeking_venue: model.seeking_venue,
            seeking_description: model.seeking_description,
        })
    }
}

impl From<entities::show::Model> for Show {
    fn from(model: entities::show::Model) -> Self {
        Show {
            id: model.id,
            venue_id: model.venue_id,
            artist_id: model.artist_id,
            start_time: model.start_time,
        }
    }
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(16)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let database = Self::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        log::info!("Database ready at: {}", path.display());
        Ok(database)
    }

    /// Connect with the given options and bring the schema up to date.
    ///
    /// sqlx enables `PRAGMA foreign_keys` on every pooled SQLite connection,
    /// so the cascade rules declared by the migrations are enforced.
    pub async fn connect(options: ConnectOptions) -> Result<Self> {
        let conn = SeaDatabase::connect(options)
            .await
            .context("Failed to connect to database")?;

        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to run database migrations")?;

        Ok(Database { conn })
    }

    pub async fn close(self) -> Result<()> {
        log::debug!("Closing database");
        self.conn
            .close()
            .await
            .context("Failed to close database")?;
        log::info!("Database closed");
        Ok(())
    }
}
