//! Default reference data for the Auraria campus deployment.
//! Every table here can be overridden from the config file.

// Somewhere in the middle of the Auraria campus
pub const REFERENCE_LAT: f64 = 39.74318700108676;
pub const REFERENCE_LON: f64 = -105.00600561574313;

pub const DEFAULT_PROXIMITY_THRESHOLD_MILES: f64 = 5.0;

pub const DEFAULT_FEED_URL: &str = "https://www.trumba.com/calendars/msudenver-events-calendars.ics";

pub const DEFAULT_CONFIG_PATH: &str = "campus_events.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "output/results.txt";

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const GOOGLE_MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GEOCODE_REQUESTS_PER_MIN: u64 = 600;
pub const FEED_FETCH_TIMEOUT_SECS: u64 = 60;

pub const UNCATEGORIZED_TAG: &str = "uncategorized";

// Environment variable names
pub const ENV_PROVIDER_KEY: &str = "GOOGLE_MAPS_API_KEY";
pub const ENV_PROVIDER_KEY_LEGACY: &str = "GoogleMapsAPI";
pub const ENV_FEEDS: &str = "CAMPUS_EVENTS_FEEDS";
pub const ENV_CONFIG_PATH: &str = "CAMPUS_EVENTS_CONFIG";
pub const ENV_PUSHGATEWAY_URL: &str = "CAMPUS_EVENTS_PUSHGATEWAY_URL";

/// Keywords that mark an event as remote (matched case-insensitively).
pub const REMOTE_KEYWORDS: &[&str] = &["remote", "teams", "online", "zoom"];

/// Building codes and landmark names that resolve straight to an address.
/// Order matters: the first code found as a substring wins.
pub const BUILDING_CODES: &[(&str, &str)] = &[
    ("PE", "1201 5th St, Denver, CO 80204"),
    ("Tivoli", "900 Auraria Pkwy, Denver, CO 80204"),
    ("Plaza", "955 Lawrence Way, Denver, CO 80204"),
    ("SSB", "890 Auraria Pkwy, Denver, CO 80204"),
    ("JSSB", "1380 Lawrence St, Denver, CO 80204"),
    ("CVA", "965 Santa Fe Dr, Denver, CO 80204"),
    ("KHE", "890 Auraria Pkwy, Denver, CO 80204"),
    ("STC", "1201 5th St, Denver, CO 80204"),
    ("SAC", "777 Lawrence Way, Denver, CO 80204"),
    ("Science", "1150 12th St, Denver, CO 80204"),
    ("Admin", "1201 5th St, Denver, CO 80204"),
    ("AD", "1201 5th St, Denver, CO 80204"),
    ("Library", "1100 Lawrence St, Denver, CO 80204"),
    ("King", "855 Lawrence Way, Denver, CO 80204"),
];

/// Topical taxonomy: category name and its representative keywords.
pub const TAG_TAXONOMY: &[(&str, &[&str])] = &[
    ("academic", &["lecture", "seminar", "class", "course", "academic", "education", "study", "research"]),
    ("career", &["career", "job fair", "internship", "employment", "resume", "interview"]),
    ("training", &["training", "workshop", "session", "learn", "skill", "development"]),
    ("holiday", &["holiday", "independence day", "thanksgiving", "christmas", "new year", "halloween"]),
    ("administrative", &["office", "admin", "administrative"]),
    ("fitness", &["zumba", "fitness", "workout", "health", "exercise", "yoga", "gym", "hiking", "running", "cycling"]),
    ("professional development", &["professional development", "skills", "growth", "leadership"]),
    ("arts and culture", &["art", "culture", "exhibition", "walk", "gallery", "museum", "performance"]),
    ("technology", &["technology", "tech", "computer", "software", "coding", "programming", "webinar", "hackathon"]),
    ("community engagement", &["community", "engage", "outreach", "volunteer", "service", "activism"]),
    ("health and wellness", &["health", "wellness", "wellbeing", "nutrition", "mental health", "self-care"]),
    ("social", &["social", "party", "celebration", "happy hour", "mixer", "reception"]),
    ("sports", &["sports", "game", "tournament", "match", "competition", "athletics", "volleyball", "basketball", "soccer", "football"]),
    ("music", &["music", "concert", "performance", "band", "orchestra", "choir"]),
    ("film", &["film", "movie", "screening", "cinema", "documentary", "short film"]),
    ("esports", &["esports", "gaming"]),
    ("food and drink", &["food", "drink", "dining", "restaurant", "cooking", "culinary", "beer", "wine"]),
    ("club", &["club", "organization", "society"]),
    ("political", &["political", "politics", "government", "election", "voting", "democracy"]),
];
