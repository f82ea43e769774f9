//! Handlers for the kiosk content API: partition CRUD, the ticker snapshot,
//! route planning and the admin session.
//!
//! Reads are open; mutations require a valid admin session. Validation
//! happens here, at the boundary — malformed entities never reach the store.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use super::{error::ApiError, AppState};
use crate::feeds::TickerItem;
use crate::route;
use crate::store::{
    Album, AlbumType, MarkerIcon, MediaCategory, MediaItem, MediaType, NewsItem, Poi, PoiCategory,
    RssFeed, SystemSettings, TimerSettings,
};

fn require_admin(app: &AppState) -> Result<(), ApiError> {
    if app.sessions.is_valid() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::BadRequest(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

// ============================================================================
// Ticker and routing
// ============================================================================

pub async fn ticker(State(app): State<Arc<AppState>>) -> Json<Vec<TickerItem>> {
    Json(app.ticker.current())
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    from: String,
    to: String,
    #[serde(default)]
    direct: bool,
}

fn parse_point(raw: &str) -> Result<[f64; 2], ApiError> {
    let mut parts = raw.split(',');
    let lat = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    let lng = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
    match (lat, lng, parts.next()) {
        (Some(lat), Some(lng), None) => Ok([lat, lng]),
        _ => Err(ApiError::BadRequest(format!(
            "expected \"lat,lng\", got \"{}\"",
            raw
        ))),
    }
}

pub async fn route_plan(Query(query): Query<RouteQuery>) -> Result<Json<route::Route>, ApiError> {
    let from = parse_point(&query.from)?;
    let to = parse_point(&query.to)?;
    Ok(Json(route::plan(from, to, query.direct)))
}

// ============================================================================
// POIs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PoiQuery {
    category: Option<String>,
}

pub async fn list_pois(
    State(app): State<Arc<AppState>>,
    Query(query): Query<PoiQuery>,
) -> Result<Json<Vec<Poi>>, ApiError> {
    let db = app.store.db().await?;
    let pois = match query.category.as_deref() {
        // "all" is a filter sentinel, not a category
        None | Some("all") => db.pois_all()?,
        Some(raw) => {
            let category = PoiCategory::from_str(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown category \"{}\"", raw)))?;
            db.pois_by_category(category)?
        }
    };
    Ok(Json(pois))
}

pub async fn get_poi(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Poi>, ApiError> {
    let db = app.store.db().await?;
    db.poi_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

fn validate_poi(poi: &Poi) -> Result<(), ApiError> {
    require("name", &poi.name)?;
    if !poi.coordinates.iter().all(|c| c.is_finite()) {
        return Err(ApiError::BadRequest("coordinates must be finite".to_string()));
    }
    Ok(())
}

pub async fn put_poi(
    State(app): State<Arc<AppState>>,
    Json(poi): Json<Poi>,
) -> Result<Json<Poi>, ApiError> {
    require_admin(&app)?;
    validate_poi(&poi)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_poi(poi)?))
}

pub async fn update_poi(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut poi): Json<Poi>,
) -> Result<Json<Poi>, ApiError> {
    require_admin(&app)?;
    poi.id = id;
    validate_poi(&poi)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_poi(poi)?))
}

pub async fn delete_poi(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_poi(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// News
// ============================================================================

pub async fn list_news(State(app): State<Arc<AppState>>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let db = app.store.db().await?;
    Ok(Json(db.news_latest()?))
}

pub async fn get_news(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NewsItem>, ApiError> {
    let db = app.store.db().await?;
    db.news_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn put_news(
    State(app): State<Arc<AppState>>,
    Json(item): Json<NewsItem>,
) -> Result<Json<NewsItem>, ApiError> {
    require_admin(&app)?;
    require("title", &item.title)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_news(item)?))
}

pub async fn update_news(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut item): Json<NewsItem>,
) -> Result<Json<NewsItem>, ApiError> {
    require_admin(&app)?;
    item.id = id;
    require("title", &item.title)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_news(item)?))
}

pub async fn delete_news(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_news(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    #[serde(rename = "type")]
    media_type: Option<String>,
    category: Option<String>,
    #[serde(rename = "albumId")]
    album_id: Option<String>,
}

pub async fn list_media(
    State(app): State<Arc<AppState>>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let db = app.store.db().await?;
    let items = if let Some(album_id) = &query.album_id {
        db.media_by_album(album_id)?
    } else if let Some(raw) = query.media_type.as_deref() {
        let media_type = MediaType::from_str(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown media type \"{}\"", raw)))?;
        db.media_by_type(media_type)?
    } else if let Some(raw) = query.category.as_deref() {
        let category = MediaCategory::from_str(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown category \"{}\"", raw)))?;
        db.media_by_category(category)?
    } else {
        db.media_all()?
    };
    Ok(Json(items))
}

pub async fn get_media(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MediaItem>, ApiError> {
    let db = app.store.db().await?;
    db.media_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn put_media(
    State(app): State<Arc<AppState>>,
    Json(item): Json<MediaItem>,
) -> Result<Json<MediaItem>, ApiError> {
    require_admin(&app)?;
    require("title", &item.title)?;
    require("url", &item.url)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_media(item)?))
}

pub async fn update_media(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut item): Json<MediaItem>,
) -> Result<Json<MediaItem>, ApiError> {
    require_admin(&app)?;
    item.id = id;
    require("title", &item.title)?;
    require("url", &item.url)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_media(item)?))
}

pub async fn delete_media(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_media(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// Albums
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlbumQuery {
    #[serde(rename = "type")]
    album_type: Option<String>,
}

pub async fn list_albums(
    State(app): State<Arc<AppState>>,
    Query(query): Query<AlbumQuery>,
) -> Result<Json<Vec<Album>>, ApiError> {
    let db = app.store.db().await?;
    let albums = match query.album_type.as_deref() {
        None => db.albums_recent()?,
        Some(raw) => {
            let album_type = AlbumType::from_str(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown album type \"{}\"", raw)))?;
            db.albums_by_type(album_type)?
        }
    };
    Ok(Json(albums))
}

pub async fn get_album(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Album>, ApiError> {
    let db = app.store.db().await?;
    db.album_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn put_album(
    State(app): State<Arc<AppState>>,
    Json(album): Json<Album>,
) -> Result<Json<Album>, ApiError> {
    require_admin(&app)?;
    require("name", &album.name)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_album(album)?))
}

pub async fn update_album(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut album): Json<Album>,
) -> Result<Json<Album>, ApiError> {
    require_admin(&app)?;
    album.id = id;
    require("name", &album.name)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_album(album)?))
}

/// Deletes the album and, in the same transaction, every media item in it.
pub async fn delete_album(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_album(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// Marker icons
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IconQuery {
    category: Option<String>,
}

pub async fn list_icons(
    State(app): State<Arc<AppState>>,
    Query(query): Query<IconQuery>,
) -> Result<Json<Vec<MarkerIcon>>, ApiError> {
    let db = app.store.db().await?;
    let icons = match query.category.as_deref() {
        None => db.icons_all()?,
        Some(category) => db.icons_by_category(category)?,
    };
    Ok(Json(icons))
}

pub async fn get_icon(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MarkerIcon>, ApiError> {
    let db = app.store.db().await?;
    db.icon_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn put_icon(
    State(app): State<Arc<AppState>>,
    Json(icon): Json<MarkerIcon>,
) -> Result<Json<MarkerIcon>, ApiError> {
    require_admin(&app)?;
    require("name", &icon.name)?;
    require("url", &icon.url)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_icon(icon)?))
}

pub async fn delete_icon(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_icon(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// Feed configs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    active: Option<bool>,
}

pub async fn list_feeds(
    State(app): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<RssFeed>>, ApiError> {
    let db = app.store.db().await?;
    let feeds = match query.active {
        None => db.feeds_all()?,
        Some(active) => db.feeds_by_active(active)?,
    };
    Ok(Json(feeds))
}

pub async fn get_feed(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RssFeed>, ApiError> {
    let db = app.store.db().await?;
    db.feed_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
}

fn validate_feed(feed: &RssFeed) -> Result<(), ApiError> {
    require("name", &feed.name)?;
    Url::parse(&feed.url)
        .map_err(|e| ApiError::BadRequest(format!("invalid feed url: {}", e)))?;
    Ok(())
}

pub async fn put_feed(
    State(app): State<Arc<AppState>>,
    Json(feed): Json<RssFeed>,
) -> Result<Json<RssFeed>, ApiError> {
    require_admin(&app)?;
    validate_feed(&feed)?;
    let db = app.store.db().await?;
    Ok(Json(db.put_feed(feed)?))
}

pub async fn delete_feed(
    State(app): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    if !db.remove_feed(&id)? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "removed": true })))
}

// ============================================================================
// Settings singletons
// ============================================================================

pub async fn get_system_settings(
    State(app): State<Arc<AppState>>,
) -> Result<Json<SystemSettings>, ApiError> {
    let db = app.store.db().await?;
    Ok(Json(db.system_settings()?.unwrap_or_default()))
}

pub async fn put_system_settings(
    State(app): State<Arc<AppState>>,
    Json(settings): Json<SystemSettings>,
) -> Result<Json<SystemSettings>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    db.put_system_settings(&settings)?;
    Ok(Json(settings))
}

pub async fn get_timer_settings(
    State(app): State<Arc<AppState>>,
) -> Result<Json<TimerSettings>, ApiError> {
    let db = app.store.db().await?;
    Ok(Json(db.timer_settings()?.unwrap_or_default()))
}

pub async fn put_timer_settings(
    State(app): State<Arc<AppState>>,
    Json(settings): Json<TimerSettings>,
) -> Result<Json<TimerSettings>, ApiError> {
    require_admin(&app)?;
    let db = app.store.db().await?;
    db.put_timer_settings(&settings)?;
    Ok(Json(settings))
}

// ============================================================================
// Session and recovery
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(app): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let ok = app
        .sessions
        .login(&request.username, &request.password)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !ok {
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn logout(State(app): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    app.sessions
        .logout()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn session_state(State(app): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "valid": app.sessions.is_valid() }))
}

/// Manual retry action for the front-end's storage banner: drop the cached
/// handle (or cached failure) and attempt a fresh open.
pub async fn reset_store(State(app): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    app.store.reset().await;
    app.store.db().await?;
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::{FeedFetcher, FetchError, NEWS_UNAVAILABLE_MESSAGE};
    use crate::session::{ADMIN_PASSWORD, ADMIN_USERNAME};
    use std::time::Duration;

    struct NoopFetcher;

    impl FeedFetcher for NoopFetcher {
        fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    fn app(dir: &tempfile::TempDir) -> Arc<AppState> {
        AppState::for_tests(dir, Arc::new(NoopFetcher))
    }

    fn poi(name: &str) -> Poi {
        Poi {
            name: name.to_string(),
            coordinates: [56.74, 37.19],
            category: PoiCategory::Building,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mutations_require_admin_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let result = put_poi(State(app.clone()), Json(poi("Reactor"))).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        let result = delete_album(State(app), Path("any".to_string())).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        app.sessions.login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap();

        let saved = put_poi(State(app.clone()), Json(poi("Reactor")))
            .await
            .unwrap()
            .0;
        assert!(!saved.id.is_empty());

        let fetched = get_poi(State(app), Path(saved.id.clone())).await.unwrap().0;
        assert_eq!(fetched.name, "Reactor");
    }

    #[tokio::test]
    async fn test_validation_rejects_before_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        app.sessions.login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap();

        let result = put_poi(State(app.clone()), Json(poi(""))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let mut bad = poi("NaN coords");
        bad.coordinates = [f64::NAN, 37.19];
        let result = put_poi(State(app), Json(bad)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_category_all_is_equivalent_to_no_filter() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let unfiltered = list_pois(State(app.clone()), Query(PoiQuery { category: None }))
            .await
            .unwrap()
            .0;
        let all = list_pois(
            State(app),
            Query(PoiQuery {
                category: Some("all".to_string()),
            }),
        )
        .await
        .unwrap()
        .0;

        // The store seeds one demo POI on first open
        assert_eq!(unfiltered.len(), 1);
        assert_eq!(all.len(), unfiltered.len());
    }

    #[tokio::test]
    async fn test_route_endpoint_validates_points() {
        let ok = route_plan(Query(RouteQuery {
            from: "56.7417,37.189".to_string(),
            to: "56.7458,37.190".to_string(),
            direct: false,
        }))
        .await
        .unwrap()
        .0;
        assert_eq!(ok.coordinates.len(), 10);

        let bad = route_plan(Query(RouteQuery {
            from: "not-a-point".to_string(),
            to: "56.7458,37.190".to_string(),
            direct: false,
        }))
        .await;
        assert!(matches!(bad, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_ticker_snapshot_defaults_to_fallback_item() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let items = ticker(State(app)).await.0;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, NEWS_UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_system_settings_default_until_written() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        app.sessions.login(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap();

        // Seeding wrote the defaults; overwrite and read back
        let mut settings = get_system_settings(State(app.clone())).await.unwrap().0;
        settings.idle_timeout = 45_000;
        put_system_settings(State(app.clone()), Json(settings))
            .await
            .unwrap();

        let loaded = get_system_settings(State(app)).await.unwrap().0;
        assert_eq!(loaded.idle_timeout, 45_000);
    }
}
