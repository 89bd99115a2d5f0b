//! String-backed enumerations shared by the entities.
//!
//! Every enum is stored as a short `VARCHAR` and serialized with the same
//! snake_case value over JSON.

use sea_orm::entity::prelude::*;
#[allow(unused_imports)]
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
        pub enum $name {
            $(
                #[sea_orm(string_value = $value)]
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $value,)+ }
            }

            pub fn all() -> Vec<Self> {
                <Self as sea_orm::Iterable>::iter().collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Staff role carried in the JWT.
    Role {
        Admin => "admin",
        Manager => "manager",
        Mechanic => "mechanic",
        Receptionist => "receptionist",
    }
}

string_enum! {
    RepairStatus {
        Waiting => "waiting",
        InProgress => "in_progress",
        Completed => "completed",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

impl RepairStatus {
    /// Allowed repair-status moves. Same-state updates are handled by callers.
    pub fn can_transition_to(self, next: RepairStatus) -> bool {
        use RepairStatus::*;
        matches!(
            (self, next),
            (Waiting, InProgress)
                | (Waiting, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Waiting)
                | (InProgress, Cancelled)
                | (Completed, Delivered)
                | (Completed, InProgress)
                | (Cancelled, Waiting)
        )
    }
}

string_enum! {
    /// Client-level payment state, derived from invoice balances.
    PaymentStatus {
        Pending => "pending",
        Partial => "partial",
        Paid => "paid",
    }
}

string_enum! {
    InvoiceStatus {
        Draft => "draft",
        Issued => "issued",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl InvoiceStatus {
    /// Invoices that still count towards receivables.
    pub fn is_open(self) -> bool {
        matches!(self, InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue)
    }

    /// Invoices that count as billed revenue.
    pub fn is_billable(self) -> bool {
        !matches!(self, InvoiceStatus::Draft | InvoiceStatus::Cancelled)
    }
}

string_enum! {
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        Transfer => "transfer",
        Check => "check",
    }
}

string_enum! {
    BudgetStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Expired => "expired",
        Converted => "converted",
    }
}

string_enum! {
    AppointmentStatus {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Whether the slot still blocks the mechanic's calendar.
    pub fn occupies_slot(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }
}

string_enum! {
    ExpenseCategory {
        Parts => "parts",
        Tools => "tools",
        Rent => "rent",
        Utilities => "utilities",
        Salaries => "salaries",
        Marketing => "marketing",
        Other => "other",
    }
}

string_enum! {
    LineItemKind {
        Service => "service",
        Part => "part",
    }
}

string_enum! {
    SampleTemperature {
        Ambient => "ambient",
        Refrigerated => "refrigerated",
        Frozen => "frozen",
    }
}

string_enum! {
    ShipmentStatus {
        Draft => "draft",
        Submitted => "submitted",
        Approved => "approved",
        Shipped => "shipped",
        Delivered => "delivered",
        Rejected => "rejected",
    }
}

impl ShipmentStatus {
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Approved, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Content is still editable by the requester.
    pub fn is_editable(self) -> bool {
        matches!(self, ShipmentStatus::Draft | ShipmentStatus::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_snake_case_values() {
        let json = serde_json::to_string(&RepairStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: InvoiceStatus = serde_json::from_str("\"partially_paid\"").unwrap();
        assert_eq!(back, InvoiceStatus::PartiallyPaid);
        assert_eq!(AppointmentStatus::NoShow.to_string(), "no_show");
    }

    #[test]
    fn repair_transitions_follow_workflow() {
        use RepairStatus::*;
        assert!(Waiting.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Delivered));
        assert!(Cancelled.can_transition_to(Waiting));
        assert!(!Waiting.can_transition_to(Delivered));
        for next in RepairStatus::all() {
            assert!(!Delivered.can_transition_to(next));
        }
    }

    #[test]
    fn shipment_transitions_are_linear() {
        use ShipmentStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(!Draft.can_transition_to(Shipped));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(Submitted.is_editable());
        assert!(!Approved.is_editable());
    }

    #[test]
    fn invoice_status_groups() {
        assert!(InvoiceStatus::Overdue.is_open());
        assert!(!InvoiceStatus::Paid.is_open());
        assert!(InvoiceStatus::Paid.is_billable());
        assert!(!InvoiceStatus::Draft.is_billable());
    }
}
