//! Admin dashboard: the newest leads of both kinds plus collection-wide
//! counters.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::model::contact::Contact;
use crate::model::enquiry::Enquiry;
use crate::model::lead::{parse_timestamp, LeadDocument, LeadKind, LeadStatus};
use crate::repository::lead_repo::{LeadFilter, LeadRepository};
use crate::repository::repository_error::RepositoryResult;
use crate::util::error::ServiceError;

pub const RECENT_FEED_SIZE: usize = 10;
const GENERAL_ENQUIRY: &str = "General Enquiry";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub kind: LeadKind,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub project: String,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at: Option<String>,
}

impl From<&Enquiry> for FeedItem {
    fn from(e: &Enquiry) -> Self {
        FeedItem {
            id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: LeadKind::Enquiry,
            name: e.full_name.clone(),
            email: e.email.clone(),
            phone: Some(e.phone.clone()),
            project: e
                .interested_in
                .clone()
                .or_else(|| e.project_name.clone())
                .unwrap_or_else(|| GENERAL_ENQUIRY.to_string()),
            message: e.message.clone(),
            status: e.status,
            created_at: e.created_at.clone(),
        }
    }
}

impl From<&Contact> for FeedItem {
    fn from(c: &Contact) -> Self {
        FeedItem {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: LeadKind::Contact,
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            project: c.service.clone(),
            message: Some(c.message.clone()),
            status: c.status,
            created_at: c.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_enquiries: u64,
    pub total_contacts: u64,
    pub total_messages: u64,
    /// Pending leads of both kinds
    pub pending_requests: u64,
    /// Same figure as `pending_requests`
    pub new_messages: u64,
    pub enquiries_this_week: u64,
    pub contacts_this_week: u64,
    /// Items of the recent feed received today (UTC)
    pub today_messages: u64,
    /// Items of the recent feed received in the last 7 days
    pub this_week_messages: u64,
    /// Rounded percentage of responded items in the recent feed
    pub response_rate: u64,
}

/// Store-side counts for one lead kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTotals {
    pub total: u64,
    pub pending: u64,
    /// Created in the trailing 7 days
    pub this_week: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadTotals {
    pub enquiries: KindTotals,
    pub contacts: KindTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub recent: Vec<FeedItem>,
    pub stats: DashboardStats,
}

fn created(created_at: Option<&str>) -> Option<DateTime<Utc>> {
    created_at.and_then(parse_timestamp)
}

fn within(created_at: Option<&str>, since: DateTime<Utc>) -> bool {
    created(created_at).is_some_and(|at| at > since)
}

/// Pure computation; issues no store queries. `enquiries` and `contacts`
/// only feed the recent list, so the newest `RECENT_FEED_SIZE` of each kind
/// are enough. Collection-wide figures come from `totals`.
pub fn aggregate(enquiries: &[Enquiry], contacts: &[Contact], totals: LeadTotals, now: DateTime<Utc>) -> Dashboard {
    let week_ago = now - Duration::days(7);

    let mut feed: Vec<FeedItem> = enquiries
        .iter()
        .map(FeedItem::from)
        .chain(contacts.iter().map(FeedItem::from))
        .collect();
    // Newest first; records without a parseable timestamp sink to the end.
    feed.sort_by(|a, b| created(b.created_at.as_deref()).cmp(&created(a.created_at.as_deref())));
    feed.truncate(RECENT_FEED_SIZE);

    let today = now.date_naive();
    let today_messages = feed
        .iter()
        .filter(|item| created(item.created_at.as_deref()).is_some_and(|at| at.date_naive() == today))
        .count();
    let this_week_messages = feed.iter().filter(|item| within(item.created_at.as_deref(), week_ago)).count();
    let responded = feed.iter().filter(|item| item.status == LeadStatus::Responded).count();
    let response_rate = if feed.is_empty() {
        0
    } else {
        ((responded as f64 / feed.len() as f64) * 100.0).round() as u64
    };

    let pending = totals.enquiries.pending + totals.contacts.pending;
    let stats = DashboardStats {
        total_enquiries: totals.enquiries.total,
        total_contacts: totals.contacts.total,
        total_messages: totals.enquiries.total + totals.contacts.total,
        pending_requests: pending,
        new_messages: pending,
        enquiries_this_week: totals.enquiries.this_week,
        contacts_this_week: totals.contacts.this_week,
        today_messages: today_messages as u64,
        this_week_messages: this_week_messages as u64,
        response_rate,
    };

    Dashboard { recent: feed, stats }
}

async fn kind_totals<T: LeadDocument>(
    repo: &dyn LeadRepository<T>,
    week_ago: DateTime<Utc>,
) -> RepositoryResult<KindTotals> {
    let (total, pending, this_week) = tokio::try_join!(
        repo.count(),
        repo.count_where(LeadFilter::with_status(LeadStatus::Pending)),
        repo.count_where(LeadFilter::created_after(week_ago)),
    )?;
    Ok(KindTotals { total, pending, this_week })
}

pub struct DashboardService {
    enquiries: Arc<dyn LeadRepository<Enquiry>>,
    contacts: Arc<dyn LeadRepository<Contact>>,
}

impl DashboardService {
    pub fn new(enquiries: Arc<dyn LeadRepository<Enquiry>>, contacts: Arc<dyn LeadRepository<Contact>>) -> Self {
        DashboardService { enquiries, contacts }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let feed_size = RECENT_FEED_SIZE as u64;
        let (enquiries, contacts, enquiry_totals, contact_totals) = tokio::try_join!(
            self.enquiries.list(1, feed_size),
            self.contacts.list(1, feed_size),
            kind_totals(self.enquiries.as_ref(), week_ago),
            kind_totals(self.contacts.as_ref(), week_ago),
        )?;
        let totals = LeadTotals { enquiries: enquiry_totals, contacts: contact_totals };
        Ok(aggregate(&enquiries, &contacts, totals, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::timestamp;
    use bson::oid::ObjectId;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn enquiry(days_ago: i64, status: LeadStatus, interested_in: Option<&str>, project: Option<&str>) -> Enquiry {
        Enquiry {
            id: Some(ObjectId::new()),
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
            location: None,
            interested_in: interested_in.map(String::from),
            budget: None,
            message: None,
            project_name: project.map(String::from),
            status,
            created_at: Some(timestamp(now() - Duration::days(days_ago))),
            updated_at: None,
        }
    }

    fn contact(days_ago: i64, status: LeadStatus) -> Contact {
        Contact {
            id: Some(ObjectId::new()),
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: None,
            service: "Interior Design".to_string(),
            message: "Need a kitchen remodel quote please.".to_string(),
            status,
            created_at: Some(timestamp(now() - Duration::days(days_ago))),
            updated_at: None,
        }
    }

    #[test]
    fn test_feed_is_merged_newest_first_and_capped() {
        let enquiries: Vec<Enquiry> = (0..8).map(|d| enquiry(d * 2, LeadStatus::Pending, None, None)).collect();
        let contacts: Vec<Contact> = (0..8).map(|d| contact(d * 2 + 1, LeadStatus::Reviewed)).collect();
        let dashboard = aggregate(&enquiries, &contacts, LeadTotals::default(), now());

        assert_eq!(dashboard.recent.len(), RECENT_FEED_SIZE);
        assert_eq!(dashboard.recent[0].kind, LeadKind::Enquiry);
        assert_eq!(dashboard.recent[1].kind, LeadKind::Contact);
        let times: Vec<_> = dashboard.recent.iter().map(|i| i.created_at.clone()).collect();
        let mut sorted = times.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(times, sorted);
    }

    #[test]
    fn test_counters_come_from_totals_and_feed() {
        let enquiries = vec![
            enquiry(0, LeadStatus::Pending, None, None),
            enquiry(3, LeadStatus::Responded, None, None),
            enquiry(10, LeadStatus::Pending, None, None),
        ];
        let contacts = vec![contact(1, LeadStatus::Pending), contact(30, LeadStatus::Responded)];
        let totals = LeadTotals {
            enquiries: KindTotals { total: 1200, pending: 700, this_week: 40 },
            contacts: KindTotals { total: 300, pending: 20, this_week: 9 },
        };
        let stats = aggregate(&enquiries, &contacts, totals, now()).stats;

        assert_eq!(stats.total_enquiries, 1200);
        assert_eq!(stats.total_contacts, 300);
        assert_eq!(stats.total_messages, 1500);
        assert_eq!(stats.pending_requests, 720);
        assert_eq!(stats.new_messages, 720);
        assert_eq!(stats.enquiries_this_week, 40);
        assert_eq!(stats.contacts_this_week, 9);
        // Feed-derived figures only look at the recent items.
        assert_eq!(stats.today_messages, 1);
        assert_eq!(stats.this_week_messages, 3);
        assert_eq!(stats.response_rate, 40);
    }

    #[test]
    fn test_project_label() {
        let with_interest = FeedItem::from(&enquiry(0, LeadStatus::Pending, Some("Skyline"), Some("Other")));
        let with_project = FeedItem::from(&enquiry(0, LeadStatus::Pending, None, Some("Riverside")));
        let neither = FeedItem::from(&enquiry(0, LeadStatus::Pending, None, None));
        assert_eq!(with_interest.project, "Skyline");
        assert_eq!(with_project.project, "Riverside");
        assert_eq!(neither.project, "General Enquiry");
        assert_eq!(FeedItem::from(&contact(0, LeadStatus::Pending)).project, "Interior Design");
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = aggregate(&[], &[], LeadTotals::default(), now());
        assert!(dashboard.recent.is_empty());
        assert_eq!(dashboard.stats.response_rate, 0);
    }
}
