use std::{fs::read_to_string, path::Path};

use url::Url;

use crate::{
    ConfigLoadError,
    models::sources::{EnvConfig, FileDatabaseConfig},
    util::parse_number,
};

const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Resolves the PostgreSQL URL.
///
/// `DATABASE_URL` wins, then `database.url` from the file, then a URL
/// assembled from `DATABASE_HOST`, `DATABASE_USER` and `DATABASE_NAME`
/// (plus the optional port and password). A resolved password is filled in
/// whenever the chosen URL carries none.
pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    let explicit = env.database_url.clone().or_else(|| {
        file_database
            .url
            .clone()
            .filter(|value| !value.trim().is_empty())
    });

    if let Some(raw) = explicit {
        let mut parsed = Url::parse(raw.trim())
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        if parsed.password().is_none()
            && let Some(password) =
                resolve_database_password(env, file_database)?
        {
            parsed
                .set_password(Some(&password))
                .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
        }
        return Ok(Some(parsed.to_string()));
    }

    let (Some(host), Some(user), Some(name)) = (
        env.database_host.as_deref(),
        env.database_user.as_deref(),
        env.database_name.as_deref(),
    ) else {
        return Ok(None);
    };

    let port = match env.database_port.as_deref() {
        Some(raw) => parse_number::<u16>("DATABASE_PORT", raw)?,
        None => DEFAULT_POSTGRES_PORT,
    };
    let mut url = Url::parse(&format!("postgresql://{host}:{port}/{name}"))
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    url.set_username(user).map_err(|_| {
        ConfigLoadError::InvalidDatabaseUsername {
            username: user.to_string(),
        }
    })?;
    if let Some(password) = resolve_database_password(env, file_database)? {
        url.set_password(Some(&password))
            .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
    }
    Ok(Some(url.to_string()))
}

pub fn resolve_database_password(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(password) = env.database_password.clone() {
        return Ok(Some(password));
    }

    for path in [
        env.database_password_file.as_ref(),
        file_database.password_file.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(secret) = read_secret_file(path)? {
            return Ok(Some(secret));
        }
    }

    Ok(None)
}

pub fn read_secret_file(
    path: &Path,
) -> Result<Option<String>, ConfigLoadError> {
    let contents = read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
