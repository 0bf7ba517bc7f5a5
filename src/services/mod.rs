//! Service layer for the harvester application.
//!
//! This module contains the leaf components of the pipeline:
//! - Anchor extraction from directory listings (`links`)
//! - WAF directory crawling (`waf`)
//! - CSW paging (`csw`)
//! - Record validation (`validate`)
//! - Bounding-box repair (`geometry`)

pub mod csw;
pub mod geometry;
pub mod links;
pub mod validate;
pub mod waf;

pub use csw::{CswClient, CswPager, CswRecord};
pub use links::ErddapLinkExtractor;
pub use validate::{ParsedRecord, ValidationOutcome, validate};
pub use waf::{LinkMode, WafCrawler};
