use log::{error, info};
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::HttpConfig,
    domain::track::{NewTrack, Track},
    http::error::{ApiError, ErrorBody},
    storage::{
        db::utc_timestamp, error::StorageError, operations::MetadataStore, query::TrackFilter,
    },
};

pub struct HttpServer {
    store: Arc<MetadataStore>,
    pub config: HttpConfig,
}

/// Outcome of `POST /tracks`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrackResponse {
    pub ok: bool,
    pub track: Option<Track>,
    pub error: Option<ErrorBody>,
}

impl HttpServer {
    pub fn new(store: MetadataStore, config: HttpConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/tracks) => {
                self.handle_all_tracks()
            },
            (POST) (/tracks) => {
                self.handle_create_track(request)
            },
            (GET) (/tracks/search) => {
                self.handle_search_tracks(request)
            },
            (GET) (/tracks/{id: i64}) => {
                self.handle_get_track(id)
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.raw_url());
    }

    fn create_track(&self, request: &Request) -> Result<Track, ApiError> {
        let candidate: NewTrack = rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid track payload: {e}")))?;

        Ok(self.store.insert(candidate.prepared(utc_timestamp()))?)
    }

    fn handle_create_track(&self, request: &Request) -> Response {
        match self.create_track(request) {
            Ok(track) => Response::json(&CreateTrackResponse {
                ok: true,
                track: Some(track),
                error: None,
            })
            .with_status_code(201),

            Err(e) => {
                error!("Failed to create track: {e:?}");
                Response::json(&CreateTrackResponse {
                    ok: false,
                    track: None,
                    error: Some(e.body()),
                })
                .with_status_code(e.status_code())
            }
        }
    }

    fn handle_get_track(&self, id: i64) -> Response {
        match self.store.fetch_by_id(id) {
            Ok(Some(track)) => Response::json(&track),
            Ok(None) => ApiError::NotFound(format!("track {id} not found")).into_response(),
            Err(e) => ApiError::from(e).into_response(),
        }
    }

    /// read failures are logged and reported as an empty list
    fn degrade_to_empty(result: Result<Vec<Track>, StorageError>, what: &str) -> Response {
        match result {
            Ok(tracks) => Response::json(&tracks),
            Err(e) => {
                error!("Database error in {what}: {e}");
                Response::json(&Vec::<Track>::new())
            }
        }
    }

    fn handle_all_tracks(&self) -> Response {
        Self::degrade_to_empty(self.store.fetch_all(), "all tracks")
    }

    fn handle_search_tracks(&self, request: &Request) -> Response {
        match Self::filter_from_request(request) {
            Ok(filter) => Self::degrade_to_empty(self.store.search(&filter), "search tracks"),
            Err(e) => e.into_response(),
        }
    }

    fn filter_from_request(request: &Request) -> Result<TrackFilter, ApiError> {
        let year = |name: &str| -> Result<Option<i64>, ApiError> {
            request
                .get_param(name)
                .map(|v| {
                    v.parse::<i64>().map_err(|_| {
                        ApiError::BadRequest(format!("{name} must be an integer, got '{v}'"))
                    })
                })
                .transpose()
        };

        Ok(TrackFilter {
            title_contains: request.get_param("title_contains"),
            band_name_contains: request.get_param("band_name_contains"),
            album_title_contains: request.get_param("album_title_contains"),
            label_contains: request.get_param("label_contains"),
            artist_main_contains: request.get_param("artist_main_contains"),
            other_artist_contains: request.get_param("other_artist_contains"),
            composer_contains: request.get_param("composer_contains"),
            min_year_recorded: year("min_year_recorded")?,
            max_year_recorded: year("max_year_recorded")?,
            min_year_released: year("min_year_released")?,
            max_year_released: year("max_year_released")?,
        })
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
