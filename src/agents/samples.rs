//! Sample prospects shown in welcome descriptors

use serde_json::{json, Value};

/// Outreach instructions for CTO-level prospects, with the full message breakdown
pub const CTO_OUTREACH_PROMPT: &str = include_str!("prompts/cto_outreach.md");

/// Outreach instructions for CTO-level prospects, pain points and geography only
pub const CTO_OUTREACH_SHORT_PROMPT: &str = include_str!("prompts/cto_outreach_short.md");

pub fn cyan_company() -> Value {
    json!({
        "name": "Cyan",
        "industry": "Healthcare Software",
        "description": "Cyan is a healthcare technology company specializing in AI-powered electronic health record solutions for behavioral health providers. We automate clinical documentation and streamline workflows through advanced AI capabilities, including large language models that generate comprehensive clinical notes. Our SaaS platform empowers healthcare providers to focus on patient care while our intelligent systems handle the administrative burden. At Cyan, we're transforming behavioral health practice management through cutting-edge technology that enhances both provider efficiency and patient outcomes."
    })
}

pub fn bakery_company() -> Value {
    json!({
        "name": "Mom & Pop Bakery",
        "industry": "Bakery",
        "description": "Mom & Pop Bakery is a small bakery that makes delicious bread and pastries. M&PB is located in a small town in the Midwest."
    })
}

/// Jane Doe at Cyan, flat name fields
pub fn jane_doe() -> Value {
    json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "location": "Austin, Texas, United States",
        "company": "Cyan",
        "role": "CTO"
    })
}

/// John Smith at Outreach, flat name fields
pub fn john_smith() -> Value {
    json!({
        "first_name": "John",
        "last_name": "Smith",
        "location": "Bellevue, Washington, United States",
        "company": "Outreach",
        "role": "CTO"
    })
}

/// Jane Doe at Cyan, nested name
pub fn jane_doe_nested() -> Value {
    json!({
        "name": { "first": "Jane", "last": "Doe" },
        "location": "Austin, Texas, United States",
        "company": "Cyan",
        "role": "CTO"
    })
}

/// John Smith at Outreach, nested name
pub fn john_smith_nested() -> Value {
    json!({
        "name": { "first": "John", "last": "Smith" },
        "location": "Bellevue, Washington, United States",
        "company": "Outreach",
        "role": "CTO"
    })
}

pub fn cyan_analysis() -> Value {
    json!({
        "prospect_fit": "Cyan operates at the intersection of behavioral health and technology, leveraging AI-powered electronic health record solutions that automate clinical documentation and enhance workflows. Their focus on AI initiatives, such as utilizing large language models for generating clinical notes, indicates a solid commitment to advancing their technological capabilities. Additionally, as a SaaS company that provides sophisticated tools for healthcare providers, they would benefit from Agentuity's simplified deployment infrastructure and cross-framework compatibility for multiple AI agents, further enhancing their service offerings and client interactions.",
        "key_focus_points": [
            "Streamline AI agent deployment with a single command, reducing the need for complex infrastructure management.",
            "Facilitate seamless communication between different AI frameworks, enhancing your AI initiatives like clinical note generation.",
            "Quickly scale your AI capabilities with a comprehensive toolkit designed for multi-channel deployment and management."
        ],
        "pain_points": [
            "Reduce the complexity and time-consuming nature of managing multiple AI frameworks like your AI Clinical Documentation and AI Assist initiatives.",
            "Eliminate infrastructure barriers that hinder rapid deployment of new AI-powered health solutions.",
            "Address framework compatibility issues that can slow down the integration and scalability of new AI features across your platform."
        ]
    })
}

pub fn outreach_analysis() -> Value {
    json!({
        "prospect_fit": "Outreach is at the forefront of integrating AI into their sales execution platform, showcasing advanced AI capabilities such as AI-powered workflows that enhance productivity and decision-making. Their features like Smart Deal Assist and AI Sales Forecasting illustrate a strong focus on leveraging AI for efficiency and predictive analytics, aligning perfectly with Agentuity's mission of simplifying AI agent deployment. By providing tools that automate repetitive tasks and optimize sales interactions, Outreach not only highlights their commitment to AI-driven technology but also indicates a scalability potential that fits well within Agentuity's ideal prospect criteria.",
        "key_focus_points": [
            "Streamline deployment of AI agents to enhance your sales workflows without the need for complex infrastructure.",
            "Enable seamless cross-framework collaboration for AI-powered tools like Smart Deal Assist and AI Sales Forecasting.",
            "Achieve rapid scaling of AI initiatives, enhancing predictive analytics and operational efficiency without additional DevOps resources."
        ],
        "pain_points": [
            "Eliminate the complexity of integrating AI capabilities into existing sales platforms without rebuilding the infrastructure.",
            "Avoid the delays in AI deployment and scaling due to complex cloud configurations.",
            "Facilitate the unification of AI tools and frameworks, preventing bottlenecks that hinder sales productivity enhancements."
        ]
    })
}
