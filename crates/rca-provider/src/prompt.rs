// crates/rca-provider/src/prompt.rs
//
// Prompt text shared by every provider.

use rca_core::ProviderRequest;

/// System role for chat-style backends.
pub const SYSTEM_PROMPT: &str = "You are an RCA generation assistant.";

/// Build the user prompt asking for the four RCA sections.
///
/// The section headings match the keywords the normalizer looks for.
pub fn rca_prompt(request: &ProviderRequest) -> String {
    format!(
        "Generate a detailed Root Cause Analysis (RCA) for the following incident.\n\
         \n\
         Incident Description: {}\n\
         Tags: {}\n\
         \n\
         Respond with exactly these sections, in this order:\n\
         1. RCA Description: a short summary of what happened.\n\
         2. Probable Causes: a list of likely causes.\n\
         3. Impacts: a list of effects on the business and its users.\n\
         4. Recommended Actions: a list of steps to resolve and prevent the incident.\n",
        request.description.trim(),
        request.tag_list()
    )
}
