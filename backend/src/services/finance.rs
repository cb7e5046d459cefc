//! Financial dashboard aggregation
//!
//! Pulls account balances, today's cash flow, receivable/payable aging,
//! inventory valuation and a 7-day profit trend into one snapshot. "Today"
//! is a day in the reference timezone, not UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::models::AgingBuckets;
use shared::reconcile::{days_between, reference_midnight, reference_today};
use shared::types::{Direction, PartnerType};

#[derive(Debug, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub account_name: String,
    pub account_type: String,
    pub balance: Decimal,
}

#[derive(Debug, Default, Serialize)]
pub struct AccountsByType {
    pub cash: Vec<Account>,
    pub bank: Vec<Account>,
    pub petty_cash: Vec<Account>,
}

#[derive(Debug, Default, Serialize)]
pub struct AccountTotals {
    pub cash: Decimal,
    pub bank: Decimal,
    pub petty_cash: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TodaySummary {
    pub sales: Decimal,
    pub expenses: Decimal,
    pub net_cash_flow: Decimal,
    pub sales_by_account: BTreeMap<Uuid, Decimal>,
    pub expenses_by_account: BTreeMap<Uuid, Decimal>,
}

#[derive(Debug, Serialize)]
pub struct OverdueEntry {
    pub partner_code: String,
    pub balance: Decimal,
    pub days_overdue: i64,
}

#[derive(Debug, Serialize)]
pub struct DueSoonEntry {
    pub partner_code: String,
    pub balance: Decimal,
    pub days_until_due: i64,
}

#[derive(Debug, Serialize)]
pub struct InventorySummary {
    pub total_value: Decimal,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfitTrendPoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub gross_profit: Decimal,
    /// Percentage rounded to one decimal place; zero when there was no
    /// revenue
    pub gross_margin: Decimal,
}

#[derive(Debug, Serialize)]
pub struct FinanceDashboard {
    pub accounts: AccountsByType,
    pub account_totals: AccountTotals,
    pub today: TodaySummary,
    pub ar_aging: AgingBuckets,
    pub ar_overdue: Vec<OverdueEntry>,
    pub ap_aging: AgingBuckets,
    pub ap_due_soon: Vec<DueSoonEntry>,
    pub ap_overdue: Vec<OverdueEntry>,
    pub inventory: InventorySummary,
    pub profit_trend: Vec<ProfitTrendPoint>,
}

#[derive(Clone)]
pub struct FinanceService {
    db: PgPool,
    timezone_offset_hours: i32,
}

impl FinanceService {
    pub fn new(db: PgPool, timezone_offset_hours: i32) -> Self {
        Self {
            db,
            timezone_offset_hours,
        }
    }

    pub async fn dashboard(&self) -> AppResult<FinanceDashboard> {
        let now = Utc::now();
        let today = reference_today(now, self.timezone_offset_hours);
        let today_start = reference_midnight(now, self.timezone_offset_hours);
        let tomorrow_start = today_start + Duration::days(1);

        let (accounts, account_totals) = self.account_balances().await?;
        let today_summary = self.today_summary(today, today_start, tomorrow_start).await?;
        let (ar_aging, ar_overdue) = self.receivable_aging(today).await?;
        let (ap_aging, ap_due_soon, ap_overdue) = self.payable_aging(today).await?;
        let inventory = self.inventory_summary().await?;
        let profit_trend = self.profit_trend(today, today_start).await?;

        Ok(FinanceDashboard {
            accounts,
            account_totals,
            today: today_summary,
            ar_aging,
            ar_overdue,
            ap_aging,
            ap_due_soon,
            ap_overdue,
            inventory,
            profit_trend,
        })
    }

    async fn account_balances(&self) -> AppResult<(AccountsByType, AccountTotals)> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, account_name, account_type, balance
            FROM accounts
            WHERE is_active = TRUE
            ORDER BY account_type, account_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut accounts = AccountsByType::default();
        let mut totals = AccountTotals::default();
        for account in rows {
            totals.total += account.balance;
            match account.account_type.as_str() {
                "bank" => {
                    totals.bank += account.balance;
                    accounts.bank.push(account);
                }
                "petty_cash" => {
                    totals.petty_cash += account.balance;
                    accounts.petty_cash.push(account);
                }
                _ => {
                    totals.cash += account.balance;
                    accounts.cash.push(account);
                }
            }
        }
        Ok((accounts, totals))
    }

    async fn today_summary(
        &self,
        today: NaiveDate,
        today_start: DateTime<Utc>,
        tomorrow_start: DateTime<Utc>,
    ) -> AppResult<TodaySummary> {
        let expense_rows = sqlx::query_as::<_, (Decimal, Option<Uuid>)>(
            "SELECT amount, account_id FROM expenses WHERE date = $1",
        )
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        let sale_rows = sqlx::query_as::<_, (Decimal, Option<Uuid>)>(
            r#"
            SELECT total, account_id FROM sales
            WHERE is_paid = TRUE AND status = 'confirmed'
              AND sale_date >= $1 AND sale_date < $2
            "#,
        )
        .bind(today_start)
        .bind(tomorrow_start)
        .fetch_all(&self.db)
        .await?;

        let mut expenses = Decimal::ZERO;
        let mut expenses_by_account: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for (amount, account_id) in expense_rows {
            expenses += amount;
            if let Some(account_id) = account_id {
                *expenses_by_account.entry(account_id).or_default() += amount;
            }
        }

        let mut sales = Decimal::ZERO;
        let mut sales_by_account: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for (total, account_id) in sale_rows {
            sales += total;
            if let Some(account_id) = account_id {
                *sales_by_account.entry(account_id).or_default() += total;
            }
        }

        Ok(TodaySummary {
            net_cash_flow: sales - expenses,
            sales,
            expenses,
            sales_by_account,
            expenses_by_account,
        })
    }

    async fn receivable_aging(
        &self,
        today: NaiveDate,
    ) -> AppResult<(AgingBuckets, Vec<OverdueEntry>)> {
        let rows = sqlx::query_as::<_, (String, Decimal, NaiveDate)>(
            r#"
            SELECT partner_code, balance, due_date FROM partner_accounts
            WHERE partner_type = $1 AND direction = $2 AND status <> 'paid'
            "#,
        )
        .bind(PartnerType::Customer.as_str())
        .bind(Direction::Ar.as_str())
        .fetch_all(&self.db)
        .await?;

        let mut aging = AgingBuckets::default();
        let mut overdue = Vec::new();
        for (partner_code, balance, due_date) in rows {
            let days_overdue = days_between(due_date, today);
            aging.add(days_overdue, balance);
            if days_overdue > 0 {
                overdue.push(OverdueEntry {
                    partner_code,
                    balance,
                    days_overdue,
                });
            }
        }
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        overdue.truncate(10);
        Ok((aging, overdue))
    }

    async fn payable_aging(
        &self,
        today: NaiveDate,
    ) -> AppResult<(AgingBuckets, Vec<DueSoonEntry>, Vec<OverdueEntry>)> {
        let rows = sqlx::query_as::<_, (String, Decimal, NaiveDate)>(
            r#"
            SELECT partner_code, balance, due_date FROM partner_accounts
            WHERE partner_type = $1 AND direction = $2 AND status <> 'paid'
            "#,
        )
        .bind(PartnerType::Vendor.as_str())
        .bind(Direction::Ap.as_str())
        .fetch_all(&self.db)
        .await?;

        let mut aging = AgingBuckets::default();
        let mut due_soon = Vec::new();
        let mut overdue = Vec::new();
        for (partner_code, balance, due_date) in rows {
            let days_overdue = days_between(due_date, today);
            aging.add(days_overdue, balance);
            if days_overdue > 0 {
                overdue.push(OverdueEntry {
                    partner_code,
                    balance,
                    days_overdue,
                });
            } else if -days_overdue <= 7 {
                due_soon.push(DueSoonEntry {
                    partner_code,
                    balance,
                    days_until_due: -days_overdue,
                });
            }
        }
        due_soon.sort_by(|a, b| a.days_until_due.cmp(&b.days_until_due));
        due_soon.truncate(10);
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        overdue.truncate(10);
        Ok((aging, due_soon, overdue))
    }

    async fn inventory_summary(&self) -> AppResult<InventorySummary> {
        let (total_value, total_quantity) = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(stock * avg_cost), 0), COALESCE(SUM(stock), 0)::bigint
            FROM products
            WHERE is_active = TRUE
            "#,
        )
        .fetch_one(&self.db)
        .await?;
        Ok(InventorySummary {
            total_value,
            total_quantity,
        })
    }

    /// Revenue, cost and margin per reference-timezone day, oldest first.
    async fn profit_trend(
        &self,
        today: NaiveDate,
        today_start: DateTime<Utc>,
    ) -> AppResult<Vec<ProfitTrendPoint>> {
        let mut trend = Vec::with_capacity(7);
        for days_back in (0..7i64).rev() {
            let day_start = today_start - Duration::days(days_back);
            let day_end = day_start + Duration::days(1);
            let date = today - Duration::days(days_back);

            let revenue: Decimal = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(total), 0) FROM sales
                WHERE status = 'confirmed' AND sale_date >= $1 AND sale_date < $2
                "#,
            )
            .bind(day_start)
            .bind(day_end)
            .fetch_one(&self.db)
            .await?;

            let cost: Decimal = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(si.cost * si.quantity), 0)
                FROM sale_items si
                JOIN sales s ON s.id = si.sale_id
                WHERE s.status = 'confirmed' AND s.sale_date >= $1 AND s.sale_date < $2
                "#,
            )
            .bind(day_start)
            .bind(day_end)
            .fetch_one(&self.db)
            .await?;

            let gross_profit = revenue - cost;
            let gross_margin = if revenue > Decimal::ZERO {
                (gross_profit / revenue * Decimal::from(100)).round_dp(1)
            } else {
                Decimal::ZERO
            };

            trend.push(ProfitTrendPoint {
                date,
                revenue,
                cost,
                gross_profit,
                gross_margin,
            });
        }
        Ok(trend)
    }
}
