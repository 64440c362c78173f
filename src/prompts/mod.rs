//! Chat-type profiles and the prompts they select.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Prompt used to fold new conversation lines into the moving summary.
///
/// `{summary}` and `{new_lines}` are substituted before sending.
pub const COMPACTION_PROMPT: &str = "You are summarizing a chat with a client. Extract only one most important insight in the fewest words possible.\n\nCurrent summary:\n{summary}\nNew lines:\n{new_lines}";

/// Prefix of the system note that carries the prior session summary.
pub const PREVIOUS_SUMMARY_PREFIX: &str = "Previous summary: ";

const SESSION_RULES: &str = "\
How to run the session:
- Ask exactly one question at a time and wait for the answer.
- Sound curious, calm and professional. Use plain language without jargon.
- Do not offer advice unless the client asks for it.
- When the client asks for help or suggestions, first answer in 5 clear points \
based on what they have shared, restate what you understood, then ask the next question.
- When current facts would help (market sizes, competitors, prices, regulations), \
use the web_search tool and cite what you found.";

const GENERIC_INTRO: &str = "\
You are a seasoned business advisor helping a client plan and grow a business. \
Guide the conversation toward a clear understanding of their idea, their customers and their goals.";

const EXECUTIVE_SUMMARY_INTRO: &str = "\
You are a seasoned business advisor running an onboarding session for a client who wants to start a business. \
Build an executive summary together: the kind of business, the motivation behind it, target customers, goals and available resources. \
If the client greets you casually, welcome them and open with: \
\"To begin, could you tell me a bit about the kind of business you're thinking of starting?\"";

const MARKET_ANALYSIS_INTRO: &str = "\
You are a seasoned business advisor working through a market analysis with a client. \
Explore the industry, market size and growth, target segments, customer needs, competitors and barriers to entry.";

const MARKETING_STRATEGY_INTRO: &str = "\
You are a seasoned business advisor helping a client shape a marketing strategy. \
Cover positioning, the ideal customer, messaging, channels, pricing and promotion, and how success will be measured.";

const FINANCIAL_PROJECTION_INTRO: &str = "\
You are a seasoned business advisor helping a client build financial projections. \
Work through startup costs, revenue streams and pricing, operating expenses, funding sources, break-even and cash flow over the first years.";

const IMPLEMENTATION_TIMELINE_INTRO: &str = "\
You are a seasoned business advisor helping a client lay out an implementation timeline. \
Establish milestones, their order and dependencies, owners, deadlines and the risks that could delay launch.";

/// The closed set of chat types with a dedicated profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatType {
    ExecutiveSummary,
    MarketAnalysis,
    MarketingStrategy,
    FinancialProjection,
    ImplementationTimeline,
}

impl ChatType {
    fn intro(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => EXECUTIVE_SUMMARY_INTRO,
            Self::MarketAnalysis => MARKET_ANALYSIS_INTRO,
            Self::MarketingStrategy => MARKETING_STRATEGY_INTRO,
            Self::FinancialProjection => FINANCIAL_PROJECTION_INTRO,
            Self::ImplementationTimeline => IMPLEMENTATION_TIMELINE_INTRO,
        }
    }

    /// The full system prompt for this profile.
    pub fn system_prompt(self) -> String {
        format!("{}\n\n{}", self.intro(), SESSION_RULES)
    }
}

/// Resolve a raw chat-type key to its system prompt.
///
/// Unrecognized keys get the generic advisor prompt.
pub fn system_prompt_for(chat_type: &str) -> String {
    match ChatType::from_str(chat_type.trim()) {
        Ok(profile) => profile.system_prompt(),
        Err(_) => generic_prompt(),
    }
}

pub fn generic_prompt() -> String {
    format!("{GENERIC_INTRO}\n\n{SESSION_RULES}")
}

/// Fill the compaction prompt.
pub fn compaction_prompt(summary: &str, new_lines: &str) -> String {
    COMPACTION_PROMPT
        .replace("{summary}", summary)
        .replace("{new_lines}", new_lines)
}
