// Database schema for the user registry
diesel::table! {
    users (user_id) {
        user_id -> Text,           // UUID in hyphenated form
        name -> Text,
        email -> Text,             // Unique, see ix_users_email
        created_at -> Timestamp,   // UTC
    }
}

pub(crate) const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS ix_users_email ON users (email);
";
