//! Declarative extraction rules
//!
//! Every product field is described by one [`ExtractionRule`]: an ordered list
//! of strategies, each a lookup paired with an acceptance check. A rule yields
//! the values of the first strategy that produces at least one accepted value.
//! The table is built once and shared read-only.

use crate::extract::text::{element_text, non_empty};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Currency symbols a price must carry
const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

/// JSON image gallery entries embedded in product page scripts
static HI_RES_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""hiRes":"([^"]+)""#).expect("valid image regex"));

/// Leading decimal number of a rating such as "4.5 out of 5 stars"
static RATING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("valid rating regex"));

/// Extracted product fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Price,
    Rating,
    RatingCount,
    Availability,
    Images,
    Features,
    Description,
}

impl Field {
    /// All fields in record order
    pub const ALL: [Field; 8] = [
        Field::Title,
        Field::Price,
        Field::Rating,
        Field::RatingCount,
        Field::Availability,
        Field::Images,
        Field::Features,
        Field::Description,
    ];

    /// Key of the field in exported records
    pub fn key(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::RatingCount => "rating_count",
            Self::Availability => "availability",
            Self::Images => "images",
            Self::Features => "features",
            Self::Description => "description",
        }
    }

    /// Whether the field holds several values
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::Images | Self::Features)
    }
}

/// Where a rule looks for candidate values
#[derive(Debug)]
pub enum Lookup {
    /// Text of the first element matching the selector
    FirstText(Selector),

    /// Text of every element matching the selector, in document order
    AllText(Selector),

    /// An attribute of every element matching the selector
    AllAttr(Selector, &'static str),

    /// First capture group of every match in the raw page body
    RawCaptures(&'static LazyLock<Regex>),
}

impl Lookup {
    fn candidates(&self, document: &Html, raw: &str) -> Vec<String> {
        match self {
            Self::FirstText(selector) => document
                .select(selector)
                .next()
                .map(element_text)
                .into_iter()
                .collect(),
            Self::AllText(selector) => document.select(selector).map(element_text).collect(),
            Self::AllAttr(selector, attr) => document
                .select(selector)
                .filter_map(|element| element.value().attr(attr))
                .map(str::to_string)
                .collect(),
            Self::RawCaptures(pattern) => pattern
                .captures_iter(raw)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect(),
        }
    }
}

/// Check applied to each trimmed candidate
///
/// Accepting a candidate may also narrow it down, as [`Acceptance::FirstNumber`]
/// does.
#[derive(Debug, Clone, Copy)]
pub enum Acceptance {
    NonEmpty,
    ContainsCurrency,
    FirstNumber,
    MentionsRating,
    ShorterThan(usize),
    LongerThan(usize),
    AbsoluteUrl,
}

impl Acceptance {
    /// Returns the accepted value, or None if the candidate is rejected
    pub fn apply(&self, candidate: &str) -> Option<String> {
        let value = non_empty(candidate)?;
        let chars = value.chars().count();

        let accepted = match self {
            Self::NonEmpty => true,
            Self::ContainsCurrency => value.contains(CURRENCY_SYMBOLS),
            Self::FirstNumber => {
                return RATING_NUMBER_RE
                    .find(&value)
                    .map(|m| m.as_str().to_string());
            }
            Self::MentionsRating => value.to_lowercase().contains("rating"),
            Self::ShorterThan(limit) => chars < *limit,
            Self::LongerThan(limit) => chars > *limit,
            Self::AbsoluteUrl => value.contains("http"),
        };

        accepted.then_some(value)
    }
}

/// One lookup and the check its candidates must pass
#[derive(Debug)]
pub struct Strategy {
    pub lookup: Lookup,
    pub accept: Acceptance,
}

impl Strategy {
    fn accepted(&self, document: &Html, raw: &str) -> Vec<String> {
        self.lookup
            .candidates(document, raw)
            .iter()
            .filter_map(|candidate| self.accept.apply(candidate))
            .collect()
    }
}

/// Ordered fallback strategies for one field
#[derive(Debug)]
pub struct ExtractionRule {
    pub field: Field,
    pub strategies: Vec<Strategy>,
}

impl ExtractionRule {
    /// Runs the strategies in order and returns the accepted values of the
    /// first one that produced any
    ///
    /// An empty vector means the field is absent from the page.
    pub fn evaluate(&self, document: &Html, raw: &str) -> Vec<String> {
        self.strategies
            .iter()
            .map(|strategy| strategy.accepted(document, raw))
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }
}

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid field selector")
}

/// Select-one lookups over `selectors`, all sharing one acceptance check
fn first_text(selectors: &[&str], accept: Acceptance) -> Vec<Strategy> {
    selectors
        .iter()
        .map(|selector| Strategy {
            lookup: Lookup::FirstText(css(selector)),
            accept,
        })
        .collect()
}

/// The rule table, one rule per field in [`Field::ALL`] order
pub static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule {
            field: Field::Title,
            strategies: first_text(
                &["#productTitle", ".product-title", "h1.a-size-large"],
                Acceptance::NonEmpty,
            ),
        },
        ExtractionRule {
            field: Field::Price,
            strategies: first_text(
                &[
                    ".a-price .a-offscreen",
                    ".a-price-whole",
                    "#price_inside_buybox",
                    ".a-price.a-text-price.a-size-medium.apexPriceToPay .a-offscreen",
                    ".a-price-range .a-offscreen",
                ],
                Acceptance::ContainsCurrency,
            ),
        },
        ExtractionRule {
            field: Field::Rating,
            strategies: first_text(&["span.a-icon-alt"], Acceptance::FirstNumber),
        },
        ExtractionRule {
            field: Field::RatingCount,
            strategies: first_text(
                &["#acrCustomerReviewText", ".a-size-base.a-color-base"],
                Acceptance::MentionsRating,
            ),
        },
        ExtractionRule {
            field: Field::Availability,
            strategies: first_text(
                &[
                    "#availability span",
                    ".a-size-medium.a-color-success",
                    ".a-size-medium.a-color-price",
                ],
                Acceptance::ShorterThan(100),
            ),
        },
        ExtractionRule {
            field: Field::Images,
            strategies: vec![
                Strategy {
                    lookup: Lookup::RawCaptures(&HI_RES_IMAGE_RE),
                    accept: Acceptance::NonEmpty,
                },
                Strategy {
                    lookup: Lookup::AllAttr(css(r#"img[data-a-image-name="landingImage"]"#), "src"),
                    accept: Acceptance::AbsoluteUrl,
                },
            ],
        },
        ExtractionRule {
            field: Field::Features,
            strategies: vec![Strategy {
                lookup: Lookup::AllText(css("#feature-bullets li span.a-list-item")),
                accept: Acceptance::LongerThan(10),
            }],
        },
        ExtractionRule {
            field: Field::Description,
            strategies: first_text(
                &[
                    "#productDescription p",
                    "#aplus .aplus-p1",
                    ".a-section.a-spacing-medium",
                ],
                Acceptance::LongerThan(50),
            ),
        },
    ]
});

/// Returns the rule for one field
pub fn rule_for(field: Field) -> &'static ExtractionRule {
    let index = Field::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or_default();
    &RULES[index]
}
