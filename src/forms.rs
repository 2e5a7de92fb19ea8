//! Submitted form payloads.
//!
//! Every field defaults to empty so the same payload serves create (required
//! fields must be non-empty) and edit (only non-empty fields overwrite).

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::database::{Artist, NewArtist, NewShow, NewVenue, Venue};
use crate::error::{BookingError, BookingResult};

/// Accepted `start_time` layouts, tried in order.
const START_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub seeking_talent: String,
    pub seeking_description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub seeking_venue: String,
    pub seeking_description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShowForm {
    pub venue_id: String,
    pub artist_id: String,
    pub start_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub search_term: String,
}

impl VenueForm {
    pub fn into_new_venue(self) -> BookingResult<NewVenue> {
        require(&[
            ("name", &self.name),
            ("city", &self.city),
            ("state", &self.state),
            ("address", &self.address),
        ])?;

        Ok(NewVenue {
            seeking_talent: parse_flag(&self.seeking_talent).unwrap_or(false),
            name: self.name,
            genres: self.genres,
            city: self.city,
            state: self.state,
            address: self.address,
            website: self.website,
            phone: self.phone,
            image_link: self.image_link,
            facebook_link: self.facebook_link,
            seeking_description: self.seeking_description,
        })
    }

    /// Overwrite the fields of `venue` that were submitted non-empty.
    pub fn apply_to(&self, venue: &mut Venue) {
        overwrite(&mut venue.name, &self.name);
        overwrite(&mut venue.city, &self.city);
        overwrite(&mut venue.state, &self.state);
        overwrite(&mut venue.address, &self.address);
        overwrite(&mut venue.phone, &self.phone);
        overwrite(&mut venue.image_link, &self.image_link);
        overwrite(&mut venue.facebook_link, &self.facebook_link);
        overwrite(&mut venue.website, &self.website);
        overwrite(&mut venue.seeking_description, &self.seeking_description);
        if !self.genres.is_empty() {
            venue.genres = self.genres.clone();
        }
        if let Some(seeking) = parse_flag(&self.seeking_talent) {
            venue.seeking_talent = seeking;
        }
    }
}

impl ArtistForm {
    pub fn into_new_artist(self) -> BookingResult<NewArtist> {
        require(&[
            ("name", &self.name),
            ("city", &self.city),
            ("state", &self.state),
        ])?;

        Ok(NewArtist {
            seeking_venue: parse_flag(&self.seeking_venue).unwrap_or(false),
            name: self.name,
            city: self.city,
            state: self.state,
            phone: self.phone,
            genres: self.genres,
            image_link: self.image_link,
            facebook_link: self.facebook_link,
            website: self.website,
            seeking_description: self.seeking_description,
        })
    }

    /// Overwrite the fields of `artist` that were submitted non-empty.
    pub fn apply_to(&self, artist: &mut Artist) {
        overwrite(&mut artist.name, &self.name);
        overwrite(&mut artist.city, &self.city);
        overwrite(&mut artist.state, &self.state);
        overwrite(&mut artist.phone, &self.phone);
        overwrite(&mut artist.image_link, &self.image_link);
        overwrite(&mut artist.facebook_link, &self.facebook_link);
        overwrite(&mut artist.website, &self.website);
        overwrite(&mut artist.seeking_description, &self.seeking_description);
        if !self.genres.is_empty() {
            artist.genres = self.genres.clone();
        }
        if let Some(seeking) = parse_flag(&self.seeking_venue) {
            artist.seeking_venue = seeking;
        }
    }
}

impl ShowForm {
    pub fn into_new_show(self) -> BookingResult<NewShow> {
        require(&[
            ("venue_id", &self.venue_id),
            ("artist_id", &self.artist_id),
            ("start_time", &self.start_time),
        ])?;

        Ok(NewShow {
            venue_id: parse_id("venue_id", &self.venue_id)?,
            artist_id: parse_id("artist_id", &self.artist_id)?,
            start_time: parse_start_time(&self.start_time)?,
        })
    }
}

fn require(fields: &[(&str, &String)]) -> BookingResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BookingError::validation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

/// Blank submissions count as unsubmitted, the same test `require` applies.
fn overwrite(target: &mut String, submitted: &str) {
    if !submitted.trim().is_empty() {
        *target = submitted.to_string();
    }
}

/// Checkbox value: empty means unsubmitted, anything else is a yes unless it
/// reads as an explicit no.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "n" | "no" | "off" | "false" | "0" => Some(false),
        _ => Some(true),
    }
}

fn parse_id(field: &str, value: &str) -> BookingResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| BookingError::validation(format!("{field} must be an integer id, got {value:?}")))
}

fn parse_start_time(value: &str) -> BookingResult<NaiveDateTime> {
    let value = value.trim();
    START_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            BookingError::validation(format!(
                "start_time must look like YYYY-MM-DD HH:MM:SS, got {value:?}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, genres};

    fn stored_venue() -> Venue {
        Venue {
            id: 1,
            name: "The Musical Hop".into(),
            genres: genres(&["Jazz", "Reggae"]),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            website: "https://www.themusicalhop.com".into(),
            phone: "123-123-1234".into(),
            image_link: "https://images.example.com/hop.png".into(),
            facebook_link: "https://www.facebook.com/TheMusicalHop".into(),
            seeking_talent: true,
            seeking_description: "We are on the lookout for a local artist".into(),
        }
    }

    #[test]
    fn test_new_venue_requires_fields() {
        let form = VenueForm {
            name: "Hop".into(),
            city: "  ".into(),
            ..Default::default()
        };

        let err = form.into_new_venue().unwrap_err();
        match err {
            BookingError::Validation(message) => {
                assert!(message.contains("city"));
                assert!(message.contains("state"));
                assert!(message.contains("address"));
                assert!(!message.contains("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_venue_defaults_optional_fields() {
        let form = VenueForm {
            name: "Hop".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            ..Default::default()
        };

        let venue = form.into_new_venue().unwrap();
        assert!(venue.genres.is_empty());
        assert!(!venue.seeking_talent);
        assert_eq!(venue.website, "");
    }

    #[test]
    fn test_blank_edit_fields_are_ignored() {
        let mut venue = stored_venue();
        VenueForm {
            name: "   ".into(),
            city: "\t".into(),
            phone: " 555-0100 ".into(),
            ..Default::default()
        }
        .apply_to(&mut venue);

        assert_eq!(venue.name, "The Musical Hop");
        assert_eq!(venue.city, "San Francisco");
        assert_eq!(venue.phone, " 555-0100 ");
    }

    #[test]
    fn test_empty_edit_leaves_venue_unchanged() {
        let mut venue = stored_venue();
        VenueForm::default().apply_to(&mut venue);
        assert_eq!(venue, stored_venue());
    }

    #[test]
    fn test_partial_edit_only_touches_submitted_fields() {
        let mut venue = stored_venue();
        let form = VenueForm {
            name: "The Musical Hop II".into(),
            genres: genres(&["Folk"]),
            seeking_talent: "n".into(),
            ..Default::default()
        };
        form.apply_to(&mut venue);

        assert_eq!(venue.name, "The Musical Hop II");
        assert_eq!(venue.genres, genres(&["Folk"]));
        assert!(!venue.seeking_talent);
        assert_eq!(venue.city, "San Francisco");
        assert_eq!(venue.phone, "123-123-1234");
    }

    #[test]
    fn test_artist_requires_name_city_state() {
        assert!(ArtistForm::default().into_new_artist().is_err());

        let artist = ArtistForm {
            name: "Guns N Petals".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            seeking_venue: "y".into(),
            genres: genres(&["Rock n Roll"]),
            ..Default::default()
        }
        .into_new_artist()
        .unwrap();
        assert!(artist.seeking_venue);
        assert_eq!(artist.genres, genres(&["Rock n Roll"]));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("y"), Some(true));
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
    }

    #[test]
    fn test_show_form_parses_ids_and_time() {
        let show = ShowForm {
            venue_id: "3".into(),
            artist_id: " 5 ".into(),
            start_time: "2035-04-01 20:00:00".into(),
        }
        .into_new_show()
        .unwrap();

        assert_eq!(show.venue_id, 3);
        assert_eq!(show.artist_id, 5);
        assert_eq!(show.start_time, at(2035, 4, 1, 20, 0));

        let html_input = ShowForm {
            venue_id: "3".into(),
            artist_id: "5".into(),
            start_time: "2035-04-01T20:00".into(),
        }
        .into_new_show()
        .unwrap();
        assert_eq!(html_input.start_time, at(2035, 4, 1, 20, 0));
    }

    #[test]
    fn test_show_form_rejects_bad_input() {
        let bad_id = ShowForm {
            venue_id: "abc".into(),
            artist_id: "5".into(),
            start_time: "2035-04-01 20:00:00".into(),
        };
        assert!(matches!(
            bad_id.into_new_show(),
            Err(BookingError::Validation(_))
        ));

        let bad_time = ShowForm {
            venue_id: "3".into(),
            artist_id: "5".into(),
            start_time: "next tuesday".into(),
        };
        assert!(matches!(
            bad_time.into_new_show(),
            Err(BookingError::Validation(_))
        ));
    }
}
