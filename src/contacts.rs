//! macOS Contacts resolution for iMessage handles.
//!
//! Display names come from the per-account AddressBook source databases under
//! `~/Library/Application Support/AddressBook/Sources`. Resolution is for
//! presentation only; voice-map keys stay raw handles throughout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

use crate::models::SELF_SENDER;

/// Find all AddressBook source databases under `sources_dir`.
pub fn find_contact_dbs(sources_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(sources_dir) else {
        return Vec::new();
    };

    let mut dbs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path().join("AddressBook-v22.abcddb"))
        .filter(|p| p.is_file())
        .collect();
    dbs.sort();
    dbs
}

/// Default AddressBook sources directory for the current user.
#[must_use]
pub fn default_sources_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join("Library")
        .join("Application Support")
        .join("AddressBook")
        .join("Sources")
}

/// Normalize a phone number to digits only.
///
/// Strips iMessage handle suffixes like `(smsft)`, then removes every
/// non-digit character.
#[must_use]
pub fn normalize_phone(number: &str) -> String {
    let without_suffix = Regex::new(r"\([^)]*\)$")
        .map(|re| re.replace(number, "").into_owned())
        .unwrap_or_else(|_| number.to_string());
    without_suffix.chars().filter(char::is_ascii_digit).collect()
}

fn build_display_name(
    first_name: Option<&str>,
    last_name: Option<&str>,
    organization: Option<&str>,
) -> String {
    let name = [first_name, last_name]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();
    if !name.is_empty() {
        return name;
    }
    organization.map(str::trim).unwrap_or_default().to_string()
}

/// Build a lookup from normalized phone numbers and lowercased emails to
/// contact names, merging all provided AddressBook databases. Unreadable or
/// partially-migrated databases are skipped.
pub fn build_contact_lookup(db_paths: &[PathBuf]) -> Result<HashMap<String, String>> {
    let mut lookup = HashMap::new();

    for db_path in db_paths {
        let Ok(conn) =
            Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        else {
            continue;
        };

        collect_phones(&conn, &mut lookup);
        collect_emails(&conn, &mut lookup);
        debug!(path = %db_path.display(), entries = lookup.len(), "Read AddressBook source");
    }

    Ok(lookup)
}

fn collect_phones(conn: &Connection, lookup: &mut HashMap<String, String>) {
    let query = "
        SELECT r.ZFIRSTNAME, r.ZLASTNAME, r.ZORGANIZATION, p.ZFULLNUMBER
        FROM ZABCDRECORD r
        JOIN ZABCDPHONENUMBER p ON r.Z_PK = p.ZOWNER
        WHERE p.ZFULLNUMBER IS NOT NULL
    ";
    let Ok(mut stmt) = conn.prepare(query) else {
        return;
    };
    let rows = stmt.query_map(params![], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    });
    let Ok(rows) = rows else { return };
    for (first, last, org, phone) in rows.flatten() {
        let name = build_display_name(first.as_deref(), last.as_deref(), org.as_deref());
        if name.is_empty() {
            continue;
        }
        let normalized = normalize_phone(&phone);
        if !normalized.is_empty() {
            lookup.insert(normalized, name);
        }
    }
}

fn collect_emails(conn: &Connection, lookup: &mut HashMap<String, String>) {
    let query = "
        SELECT r.ZFIRSTNAME, r.ZLASTNAME, r.ZORGANIZATION, e.ZADDRESSNORMALIZED
        FROM ZABCDRECORD r
        JOIN ZABCDEMAILADDRESS e ON r.Z_PK = e.ZOWNER
        WHERE e.ZADDRESSNORMALIZED IS NOT NULL
    ";
    let Ok(mut stmt) = conn.prepare(query) else {
        return;
    };
    let rows = stmt.query_map(params![], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
        ))
    });
    let Ok(rows) = rows else { return };
    for (first, last, org, email) in rows.flatten() {
        let name = build_display_name(first.as_deref(), last.as_deref(), org.as_deref());
        if !name.is_empty() {
            lookup.insert(email.to_lowercase(), name);
        }
    }
}

/// Resolve raw iMessage handles to display names.
///
/// Returns a map from each raw handle to a contact name, or the handle itself
/// when no contact matches.
#[must_use]
pub fn resolve_participants(
    participants: &[String],
    contact_lookup: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut result = HashMap::new();

    for handle in participants {
        if handle == SELF_SENDER {
            result.insert(handle.clone(), SELF_SENDER.to_string());
            continue;
        }

        // Phone lookup on the normalized digits
        let normalized = normalize_phone(handle);
        if !normalized.is_empty() {
            if let Some(name) = contact_lookup.get(&normalized) {
                result.insert(handle.clone(), name.clone());
                continue;
            }
        }

        // Email lookup, case-insensitive
        if let Some(name) = contact_lookup.get(&handle.to_lowercase()) {
            result.insert(handle.clone(), name.clone());
            continue;
        }

        result.insert(handle.clone(), handle.clone());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_phone("+15551234567(smsft)"), "15551234567");
        assert_eq!(normalize_phone("not a number"), "");
    }

    #[test]
    fn test_resolve_participants_falls_back_to_handle() {
        let lookup = HashMap::new();
        let participants = vec!["+15551234567".to_string(), "Me".to_string()];
        let resolved = resolve_participants(&participants, &lookup);
        assert_eq!(resolved["+15551234567"], "+15551234567");
        assert_eq!(resolved["Me"], "Me");
    }

    #[test]
    fn test_resolve_participants_by_phone_and_email() {
        let mut lookup = HashMap::new();
        lookup.insert("15551234567".to_string(), "Phil".to_string());
        lookup.insert("friend@example.com".to_string(), "Robert".to_string());

        let participants = vec![
            "+1 (555) 123-4567".to_string(),
            "Friend@Example.com".to_string(),
        ];
        let resolved = resolve_participants(&participants, &lookup);
        assert_eq!(resolved["+1 (555) 123-4567"], "Phil");
        assert_eq!(resolved["Friend@Example.com"], "Robert");
    }

    #[test]
    fn test_find_contact_dbs_missing_dir() {
        assert!(find_contact_dbs(Path::new("/nonexistent/dir")).is_empty());
    }
}
