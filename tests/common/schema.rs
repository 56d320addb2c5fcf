//! Booking platform models shared by the integration tests.

use datarepo::core::value::Json;
use datarepo::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[model(table = "users", primary_key = "user_id")]
pub struct User {
    pub user_id: Option<i64>,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: String,
    pub reset_token: Option<String>,
    pub last_login: Option<i64>,
    pub created_at: Option<String>,
    #[model(skip)]
    pub session: Option<String>,
}

impl User {
    pub fn new(username: &str, email: &str) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: "$2y$10$hash".into(),
            role: "customer".into(),
            ..Default::default()
        }
    }
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[model(table = "events", primary_key = "event_id")]
pub struct Event {
    pub event_id: Option<i64>,
    pub name: String,
    pub location: String,
    pub date: Option<String>,
    #[model(references = User, join = "organizer")]
    pub organizer_id: Option<i64>,
    #[model(join)]
    pub organizer: Option<User>,
    /// Filled by callers from a count query
    #[model(serialize)]
    pub attendee_count: i64,
}

impl Event {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ..Default::default()
        }
    }
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[model(table = "bookings", primary_key = "booking_id")]
pub struct Booking {
    pub booking_id: Option<i64>,
    #[model(references = Event, join = "event")]
    pub event_id: i64,
    #[model(references = User, join = "user")]
    pub user_id: i64,
    pub status: String,
    pub created_at: Option<String>,
    #[model(join)]
    pub event: Option<Event>,
    #[model(join)]
    pub user: Option<User>,
}

impl Booking {
    pub fn new(event_id: i64, user_id: i64, status: &str) -> Self {
        Self {
            event_id,
            user_id,
            status: status.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[model(table = "profiles", primary_key = "profile_id")]
pub struct Profile {
    pub profile_id: Option<i64>,
    #[model(references = User, join = "user")]
    pub user_id: Option<i64>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    #[model(column = "contact_info")]
    pub contact: Option<Json<Contact>>,
    #[model(join)]
    pub user: Option<User>,
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[model(table = "reviews", primary_key = "review_id")]
pub struct Review {
    pub review_id: Option<i64>,
    #[model(references = User, join = "dj")]
    pub dj_id: i64,
    pub event_id: i64,
    pub author_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub recommended: bool,
    #[model(join)]
    pub dj: Option<User>,
}

pub const SCHEMA: &str = "
CREATE TABLE users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'customer',
    reset_token TEXT,
    last_login INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    location TEXT NOT NULL DEFAULT '',
    date TEXT,
    organizer_id INTEGER REFERENCES users(user_id)
);
CREATE TABLE bookings (
    booking_id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL REFERENCES events(event_id),
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE profiles (
    profile_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(user_id),
    bio TEXT,
    profile_picture TEXT,
    contact_info TEXT
);
CREATE TABLE reviews (
    review_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dj_id INTEGER NOT NULL REFERENCES users(user_id),
    event_id INTEGER NOT NULL REFERENCES events(event_id),
    author_id INTEGER NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT,
    recommended INTEGER NOT NULL DEFAULT 0
);
";
