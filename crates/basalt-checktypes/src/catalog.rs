//! Catalog resolution.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use basalt_core::{Catalog, Checktype, Error, Result};
use basalt_containers::ContainerEngine;

use crate::build::CheckSource;
use crate::fetch;

/// Shape of a catalog payload.
#[derive(Debug, Deserialize)]
struct CatalogPayload {
    checktypes: Vec<Checktype>,
}

/// Resolves an ordered list of checktype sources into a single catalog.
///
/// Directory sources are built locally through `engine`; everything else is
/// fetched and decoded as a catalog payload. When two sources declare the
/// same checktype name, the later one wins.
pub async fn resolve<C: ContainerEngine>(sources: &[String], engine: &C) -> Result<Catalog> {
    if sources.is_empty() {
        return Err(Error::MissingCatalogs);
    }

    let mut catalog = Catalog::new();
    for source in sources {
        if let Some(dir) = local_dir(source)? {
            info!("building checktype from {}", dir.display());
            let checktype = CheckSource::new(dir).build(engine).await?;
            catalog.insert(checktype.name.clone(), checktype);
            continue;
        }

        let data = fetch::fetch(source).await?;
        let payload: CatalogPayload =
            serde_json::from_slice(&data).map_err(|e| Error::MalformedCatalog {
                url: source.clone(),
                reason: e.to_string(),
            })?;
        debug!("{} checktypes in catalog {source}", payload.checktypes.len());
        for checktype in payload.checktypes {
            catalog.insert(checktype.name.clone(), checktype);
        }
    }

    info!("resolved {} checktypes from {} sources", catalog.len(), sources.len());
    Ok(catalog)
}

/// Interprets a source as a local directory, when it is one.
///
/// Sources with a URL scheme are never directories. Scheme-less sources are
/// paths, which qualify only if they exist and are directories; missing
/// paths fall through to the fetcher, where they fail as unreadable files.
fn local_dir(source: &str) -> Result<Option<&Path>> {
    match Url::parse(source) {
        Ok(_) => Ok(None),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(source);
            match std::fs::metadata(path) {
                Ok(meta) if meta.is_dir() => Ok(Some(path)),
                Ok(_) => Ok(None),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(Error::InvalidUrl {
            url: source.to_string(),
            reason: e.to_string(),
        }),
    }
}
