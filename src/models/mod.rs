// Domain models (ported from the Go fuel-monitor API)

mod dashboard;
mod metrics;
mod report;
mod site;
mod user;

pub use dashboard::{
    ActivityItem, AlertStatus, DashboardData, SensorReading, SiteWithReadings, SystemStatus,
    ViewMode,
};
pub use metrics::{CumulativeReading, FuelMetrics, FuelSample, PowerMetrics, StateSample};
pub use report::{
    CumulativeRequest, DateRange, DayReport, DaySummary, ErrorResponse, HealthResponse,
    RangeReport, RangeSummary, SiteDayResult, SiteRangeResult, SiteStatus, UserInfo,
};
pub use site::Site;
pub use user::{AuthedUser, Role};
