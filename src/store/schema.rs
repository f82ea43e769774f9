pub const SCHEMA: &str = r#"
-- Points of interest shown on the kiosk map
CREATE TABLE IF NOT EXISTS pois (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    short_description TEXT NOT NULL DEFAULT '',
    full_description TEXT NOT NULL DEFAULT '',
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    images TEXT NOT NULL DEFAULT '[]',  -- JSON array of image URLs
    address TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    icon_url TEXT
);

CREATE INDEX IF NOT EXISTS idx_pois_category ON pois(category);

-- News items shown on the news page and in detail views
CREATE TABLE IF NOT EXISTS news (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    image TEXT,
    date TEXT NOT NULL,
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_news_date ON news(date);

-- Gallery media items; album_id is NULL for items outside any album
CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    media_type TEXT NOT NULL,  -- 'image' or 'video'
    url TEXT NOT NULL,
    thumbnail TEXT,
    category TEXT NOT NULL,    -- 'photo' or 'video'
    date TEXT NOT NULL,
    album_id TEXT,
    file_size INTEGER,
    duration REAL,
    dimensions TEXT,
    tags TEXT                  -- JSON array
);

CREATE INDEX IF NOT EXISTS idx_media_type ON media(media_type);
CREATE INDEX IF NOT EXISTS idx_media_category ON media(category);
CREATE INDEX IF NOT EXISTS idx_media_album ON media(album_id);

-- Albums; item_count is derived from media and kept current by the store
CREATE TABLE IF NOT EXISTS albums (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    cover_image_id TEXT,       -- may dangle; the UI falls back to the first image
    album_type TEXT NOT NULL,  -- 'photo', 'video' or 'mixed'
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    item_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_albums_type ON albums(album_type);
CREATE INDEX IF NOT EXISTS idx_albums_created ON albums(created_at);

-- Custom marker glyphs overriding the per-category map defaults
CREATE TABLE IF NOT EXISTS icons (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    url TEXT NOT NULL,
    blob BLOB
);

CREATE INDEX IF NOT EXISTS idx_icons_category ON icons(category);

-- RSS feed configs; active feeds participate in the ticker cycle
CREATE TABLE IF NOT EXISTS feeds (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_feeds_active ON feeds(active);

-- Keyed singletons ('system_settings', 'timer-settings'), JSON payloads
CREATE TABLE IF NOT EXISTS settings (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Additive migrations for databases created by earlier schema versions.
/// Each statement is applied best-effort; failures (column already exists)
/// are ignored.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE media ADD COLUMN dimensions TEXT",
    "ALTER TABLE media ADD COLUMN tags TEXT",
    "ALTER TABLE icons ADD COLUMN blob BLOB",
];
