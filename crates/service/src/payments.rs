//! Payment history listing across invoices.

use common::types::Page;
use models::payment;

use crate::errors::ServiceError;
use crate::invoices::check_range;
use crate::pagination::Pagination;
use crate::repository::{PaymentFilter, Repositories};

#[derive(Clone)]
pub struct PaymentService {
    repos: Repositories,
}

impl PaymentService {
    pub fn new(repos: Repositories) -> Self { Self { repos } }

    pub async fn list(&self, filter: PaymentFilter, page: Pagination) -> Result<Page<payment::Model>, ServiceError> {
        check_range(filter.from, filter.to)?;
        let (rows, total) = self.repos.payments.find(&filter, Some(page)).await?;
        Ok(page.page_of(rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoices::PaymentInput;
    use crate::test_support::{client_input, invoice_input, services};
    use chrono::{NaiveDate, TimeZone, Utc};
    use models::enums::PaymentMethod;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn lists_by_client_and_day_window() -> Result<(), anyhow::Error> {
        let s = services();
        let c1 = s.clients.create(client_input("2000AAA")).await?;
        let c2 = s.clients.create(client_input("2000BBB")).await?;
        let i1 = s.invoices.create(invoice_input(c1.id, true)).await?;
        let i2 = s.invoices.create(invoice_input(c2.id, true)).await?;

        let at = |d: u32| Some(Utc.with_ymd_and_hms(2024, 6, d, 18, 30, 0).unwrap().into());
        for (inv, day) in [(&i1, 3), (&i1, 10), (&i2, 10)] {
            let input = PaymentInput { amount: dec!(10), method: PaymentMethod::Cash, reference: None, paid_at: at(day) };
            s.invoices.record_payment(inv.id, None, input).await?;
        }

        let by_client = s.payments.list(PaymentFilter { client_id: Some(c1.id), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(by_client.total, 2);
        assert!(by_client.items[0].paid_at > by_client.items[1].paid_at);

        let day = NaiveDate::from_ymd_opt(2024, 6, 10);
        let same_day = s.payments.list(PaymentFilter { from: day, to: day, ..Default::default() }, Pagination::default()).await?;
        assert_eq!(same_day.total, 2);

        let inverted = PaymentFilter { from: day, to: NaiveDate::from_ymd_opt(2024, 6, 1), ..Default::default() };
        assert!(s.payments.list(inverted, Pagination::default()).await.is_err());
        Ok(())
    }
}
