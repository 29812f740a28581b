pub const MODEL_API_KEY_ENV_NAME: &str = "LISTLIFT_MODEL_API_KEY";

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

/// Product detail page URL prefix; the ASIN is appended.
pub(crate) const PRODUCT_PAGE_URL: &str = "https://www.amazon.com/dp/";

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub(crate) const FETCH_TIMEOUT_SECS: u64 = 30;

/// Titles shorter than this are treated as an unusable extraction.
pub(crate) const MIN_TITLE_LEN: usize = 5;

pub(crate) const MIN_BULLET_LEN: usize = 10;

/// Disclaimer fragment Amazon injects as the first feature bullet on some listings.
pub(crate) const BULLET_BOILERPLATE: &str = "Make sure this fits";

/// A stored product is served from the database for this long before re-fetching.
pub(crate) const PRODUCT_FRESH_SECS: i64 = 24 * 60 * 60;

/// A stored optimization is served from the database for this long before regenerating.
pub(crate) const OPTIMIZATION_FRESH_SECS: i64 = 60 * 60;

pub const MAX_FETCH_BATCH: usize = 10;
pub const MAX_OPTIMIZE_BATCH: usize = 5;

pub(crate) const MAX_KEYWORDS: usize = 5;

pub const MAX_LIST_LIMIT: u32 = 100;
pub const MAX_HISTORY_LIMIT: u32 = 50;
pub const MAX_SEARCH_LIMIT: u32 = 100;

pub(crate) const GENERATION_CALLS: u32 = 4;

pub(crate) const STATS_WINDOW_DAYS: u32 = 30;

pub(crate) const TITLE_PROMPT_TEMPLATE: &str = r#"
You will see the original title of an Amazon product listing.
Rewrite it so it is clearer and more compelling for catalog search,
keeping every factual claim and any brand or category wording it contains.
Keep the result under 200 characters.
Answer with the rewritten title only, no explanations and no surrounding quotes.
Original title: {title}
Listing context: {context}"#;

pub(crate) const BULLETS_PROMPT_TEMPLATE: &str = r#"
You will see the feature bullets of an Amazon product listing titled {title}.
Rewrite them as five concise, benefit-led bullet points.
Answer with the bullet points only, one per line.
Original bullets:
{bullets}"#;

pub(crate) const DESCRIPTION_PROMPT_TEMPLATE: &str = r#"
You will see the description of an Amazon product listing titled {title}.
Rewrite it as a persuasive paragraph that keeps every factual claim.
Answer with the description only.
Original description:
{description}"#;

pub(crate) const KEYWORDS_PROMPT_TEMPLATE: &str = r#"
You will see an Amazon product listing.
Suggest search keywords shoppers would use to find it.
Answer with up to 5 keywords, comma-separated, nothing else.
Title: {title}
Listing context: {context}"#;
