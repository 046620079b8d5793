use askama::Template;

#[derive(Template)]
#[template(path = "email/client_confirmation.txt")]
pub struct ClientConfirmation<'a> {
    pub company_name: &'a str,
    pub name: &'a str,
    pub response_id: &'a str,
    pub services: &'a str,
    pub timeline: &'a str,
    pub budget: &'a str,
    pub business_email: &'a str,
    pub link_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/admin_alert.txt")]
pub struct AdminAlert<'a> {
    pub response_id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub company: &'a str,
    pub services: &'a str,
    pub project_type: &'a str,
    pub package_tier: &'a str,
    pub timeline: &'a str,
    pub budget: &'a str,
    pub lead_source: &'a str,
    pub requirements: &'a str,
    pub priority: &'a str,
    pub dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/urgent_alert.txt")]
pub struct UrgentAlert<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub reasons: Vec<&'static str>,
    pub response_id: &'a str,
}

#[derive(Template)]
#[template(path = "email/error_alert.txt")]
pub struct ErrorAlert<'a> {
    pub context: &'a str,
    pub error: &'a str,
    pub occurred_at: String,
}

pub struct Bucket {
    pub label: String,
    pub count: i64,
}

#[derive(Template)]
#[template(path = "email/daily_report.txt")]
pub struct DailyReport<'a> {
    pub company_name: &'a str,
    pub date: String,
    pub total: i64,
    pub high_priority: i64,
    pub low_priority: i64,
    pub by_budget: Vec<Bucket>,
    pub by_lead_source: Vec<Bucket>,
    pub dashboard_url: &'a str,
}
