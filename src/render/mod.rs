//! HTML rendering with Handlebars templates
//!
//! This module turns a [`SelectionCoordinator`] into the race card page and
//! renders single races as fragments. The page swaps fragments in place when
//! the picker changes, so the same fragment markup is used for the initial
//! render and for later selections.

use chrono::{DateTime, NaiveDateTime};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::models::{Attachment, AttachmentKind, RaceRecord};
use crate::selection::SelectionCoordinator;
use crate::utils::encode_path_segment;

/// Page template
const PAGE_TEMPLATE: &str = include_str!("../../templates/page.hbs");

/// Race card partial, also rendered alone as a fragment
const RACE_TEMPLATE: &str = include_str!("../../templates/race.hbs");

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to register template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Where the page script loads race fragments from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentLinks {
    /// Served by the viewer server at `/fragments/{id}.html`
    Server,
    /// Files next to an exported `index.html`
    Static,
}

impl FragmentLinks {
    /// URL of the fragment for `race_id`
    pub fn href(&self, race_id: &str) -> String {
        match self {
            Self::Server => format!("/fragments/{}.html", encode_path_segment(race_id)),
            // The file name on disk is already encoded, so encode once more
            // for the URL that refers to it
            Self::Static => format!("fragments/{}", encode_path_segment(&fragment_file_name(race_id))),
        }
    }
}

/// File name of an exported fragment
pub fn fragment_file_name(race_id: &str) -> String {
    format!("{}.html", encode_path_segment(race_id))
}

#[derive(Debug, Serialize)]
struct PageData<'a> {
    site_title: &'a str,
    empty_message: &'a str,
    disclaimer: &'a str,
    query_param: &'a str,
    has_races: bool,
    options: Vec<OptionData>,
    race: Option<RaceData>,
}

#[derive(Debug, Serialize)]
struct OptionData {
    value: String,
    label: String,
    selected: bool,
    fragment: String,
}

#[derive(Debug, Serialize)]
struct RaceData {
    id: String,
    title: String,
    datetime: Option<String>,
    track: Option<String>,
    distance: Option<String>,
    has_meta: bool,
    predictions: Vec<PredictionRow>,
    /// Manifest order, kinds interleaved
    attachments: Vec<AttachmentData>,
}

#[derive(Debug, Serialize)]
struct PredictionRow {
    rank: usize,
    horse_name: String,
    /// Text so that gate 0 still renders
    draw: Option<String>,
    win_percent: String,
}

#[derive(Debug, Serialize)]
struct AttachmentData {
    is_pdf: bool,
    is_image: bool,
    is_link: bool,
    label: String,
    src: String,
    filename: Option<String>,
}

impl From<&Attachment> for AttachmentData {
    fn from(attachment: &Attachment) -> Self {
        Self {
            is_pdf: attachment.kind == AttachmentKind::Pdf,
            is_image: attachment.kind == AttachmentKind::Image,
            is_link: attachment.kind == AttachmentKind::Link,
            label: attachment.label.clone(),
            src: attachment.src.clone(),
            filename: attachment.filename.clone(),
        }
    }
}

impl From<&RaceRecord> for RaceData {
    fn from(race: &RaceRecord) -> Self {
        Self {
            id: race.id.clone(),
            title: race.label().to_string(),
            datetime: race.datetime.as_deref().map(format_datetime),
            track: race.track.clone(),
            distance: race.distance.clone(),
            has_meta: race.datetime.is_some() || race.track.is_some() || race.distance.is_some(),
            predictions: race
                .predictions
                .iter()
                .enumerate()
                .map(|(i, p)| PredictionRow {
                    rank: i + 1,
                    horse_name: p.horse_name.clone(),
                    draw: p.draw.map(|d| d.to_string()),
                    win_percent: p.win_percent(),
                })
                .collect(),
            attachments: race.attachments.iter().map(AttachmentData::from).collect(),
        }
    }
}

/// Format a manifest datetime for display
///
/// RFC 3339 and `YYYY-MM-DDTHH:MM[:SS]` values become `YYYY-MM-DD HH:MM`
/// in their own offset; anything else is shown as written.
pub fn format_datetime(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }

    raw.to_string()
}

/// Page renderer with Handlebars template engine
pub struct PageRenderer {
    /// Handlebars template engine
    handlebars: Handlebars<'static>,

    site: SiteConfig,
}

impl PageRenderer {
    /// Create a renderer with the built-in templates
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Template` if a template fails to compile
    pub fn new(site: SiteConfig) -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();

        handlebars
            .register_template_string("page", PAGE_TEMPLATE)
            .map_err(Box::new)?;
        handlebars
            .register_partial("race_card", RACE_TEMPLATE)
            .map_err(Box::new)?;
        handlebars
            .register_template_string("race", RACE_TEMPLATE)
            .map_err(Box::new)?;

        Ok(Self { handlebars, site })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Render the full page for the coordinator's current selection
    pub fn render_page(
        &self,
        coordinator: &SelectionCoordinator,
        links: FragmentLinks,
    ) -> Result<String, RenderError> {
        let options = coordinator
            .options()
            .into_iter()
            .map(|o| OptionData {
                fragment: links.href(&o.value),
                value: o.value,
                label: o.label,
                selected: o.selected,
            })
            .collect::<Vec<_>>();

        let data = PageData {
            site_title: &self.site.title,
            empty_message: &self.site.empty_message,
            disclaimer: &self.site.disclaimer,
            query_param: coordinator.param(),
            has_races: !options.is_empty(),
            options,
            race: coordinator.active().map(RaceData::from),
        };

        Ok(self.handlebars.render("page", &data)?)
    }

    /// Render one race card
    pub fn render_fragment(&self, race: &RaceRecord) -> Result<String, RenderError> {
        Ok(self.handlebars.render("race", &RaceData::from(race))?)
    }
}
