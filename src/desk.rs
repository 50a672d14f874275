//! Assembly of the research desk: the three agents and the task chain that
//! turns raw market searches into the published brief.

use std::sync::Arc;

use crate::agent::Agent;
use crate::config::AppConfig;
use crate::error::Result;
use crate::llm::LanguageModelClient;
use crate::pipeline::Pipeline;
use crate::task::Task;
use crate::tool::{Tool, ToolRegistry};
use crate::tools::{SearchConfig, SearchTool};

/// Build the sector-research → stock-selection → report chain. All three
/// agents share one search tool and the configured model client.
pub fn research_pipeline(
    model: Arc<dyn LanguageModelClient>,
    config: &AppConfig,
) -> Result<Pipeline> {
    let search_tool: Arc<dyn Tool> = Arc::new(SearchTool::new(SearchConfig {
        max_results: config.search.max_results,
        timeout_secs: config.search.timeout_secs,
    })?);
    let with_search = || {
        let mut tools = ToolRegistry::new();
        tools.register_arc(Arc::clone(&search_tool));
        tools
    };

    let market_researcher = Arc::new(
        Agent::new(Arc::clone(&model))
            .with_role("Stock Market Researcher")
            .with_goal(
                "Identify the top performing stocks and sectors with strong growth \
                 potential for the current year",
            )
            .with_backstory(
                "You are a financial analyst with expertise in identifying high-growth \
                 stocks across different sectors.",
            )
            .with_tools(with_search())
            .with_max_rounds(config.agent.max_rounds),
    );

    let stock_analyst = Arc::new(
        Agent::new(Arc::clone(&model))
            .with_role("Stock Analyst")
            .with_goal("Analyze and select the top 10 stocks to invest in for the current year")
            .with_backstory(
                "You are a seasoned stock analyst with 10+ years of experience in \
                 fundamental and technical analysis.",
            )
            .with_tools(with_search())
            .with_max_rounds(config.agent.max_rounds),
    );

    let investment_advisor = Arc::new(
        Agent::new(model)
            .with_role("Investment Advisor")
            .with_goal("Create a compelling investment recommendation report for the top 10 stocks")
            .with_backstory(
                "You are a professional investment advisor who helps clients make \
                 informed decisions.",
            )
            .with_tools(with_search())
            .with_max_rounds(config.agent.max_rounds),
    );

    Pipeline::new(
        "investment-brief",
        vec![
            Task::new(
                "market_research",
                "Research current stock market trends and identify sectors with strong \
                 growth potential for the current year.",
                "A list of 5-7 promising sectors with explanations of why they have \
                 growth potential this year",
                market_researcher,
            ),
            Task::new(
                "stock_selection",
                "Based on the sector research, identify the top 10 stocks to invest in \
                 this year.",
                "A list of 10 stocks with their basic information and investment rationale",
                stock_analyst,
            )
            .depends_on("market_research"),
            Task::new(
                "investment_report",
                "Create a comprehensive investment report presenting the top 10 stocks \
                 to invest in this year.",
                "A well-formatted investment report in markdown with detailed analysis \
                 of each recommended stock",
                investment_advisor,
            )
            .depends_on("market_research")
            .depends_on("stock_selection"),
        ],
    )
}
