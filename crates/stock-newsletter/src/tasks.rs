//! The newsletter tasks
//!
//! Texts take the kickoff inputs `ticket` and `current_date`.

use crew_process::Task;

use crate::agents::{news_analyst, price_analyst, report_writer};

pub const GET_STOCK_PRICE: &str = "get_stock_price";
pub const GET_NEWS: &str = "get_news";
pub const WRITE_ANALYSIS: &str = "write_analysis";

pub fn get_stock_price() -> Task {
    Task::new(
        GET_STOCK_PRICE,
        "Analyze the stock {{ ticket }} price history and create a trend analyses for up, down or sideways",
        "Specify the current trend stock price - up, down or sideways.
eg. stock='AAPL, price UP'",
    )
    .agent(price_analyst::NAME)
}

pub fn get_news() -> Task {
    Task::new(
        GET_NEWS,
        "Take the stock and always include BTC to it (if not requested). \
Use the search tool to search each one individually.

The current date is {{ current_date }}.

Compose the results into a helpful report.",
        "A summary of the overall market and one sentence summary for each requested asset (stock and BTC).
Include a fear/greed score for each asset (stock and BTC) based on the news. Use format:
<STOCK ASSET>
<SUMMARY BASED ON NEWS>
<TREND PREDICTION>
<FEAR/GREED SCORE>",
    )
    .agent(news_analyst::NAME)
}

pub fn write_analysis() -> Task {
    Task::new(
        WRITE_ANALYSIS,
        "Use the stock price trend and the stock news report to create an analysis and write the newsletter \
about the {{ ticket }} company that is brief and highlights the most important points.
Focus on the stock price trend, news and fear/greed score. What are the near future considerations?
Include the previous analysis of stock trend and news summary.",
        "An eloquent 3 paragraphs newsletter formated as markdown in a easy readable manner.
It should contain:
- 3 bullets executive summary
- Introduction: set the overall picture and spike up the interest
- main part: provides the meat of the analysis including the news summary and fear/greed scores
- summary: key facts and concrete future trend prediction - up, down or sideways.",
    )
    .agent(report_writer::NAME)
    .context([GET_STOCK_PRICE, GET_NEWS])
}

/// All three, in execution order
pub fn newsletter_tasks() -> Vec<Task> {
    vec![get_stock_price(), get_news(), write_analysis()]
}
