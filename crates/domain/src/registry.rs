//! Enumeration registry.
//!
//! Every closed tag set used by the platform lives here, so the schema
//! validator and the lifecycle machines agree on one spelling per tag.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enermina_core::AppError;
use serde::{Deserialize, Serialize};

macro_rules! tag_set {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$variant_meta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            /// Stable storage values, in declaration order.
            pub const TAGS: &'static [&'static str] = &[$($tag),+];

            /// Returns the stable storage value for this tag.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            /// Returns every tag of the set.
            #[must_use]
            pub fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(AppError::Validation(format!(
                        "unknown {} value '{value}'",
                        $label
                    ))),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use tag_set;

tag_set! {
    /// Identity-provider group of a user.
    UserRole, "user role" {
        /// Platform administrator.
        Admin => "ADMIN",
        /// Professional offering resources and services.
        Professional => "PROFESSIONAL",
        /// Default community member.
        Subscriber => "SUBSCRIBER",
    }
}

tag_set! {
    /// Self-declared gender on a user profile.
    Gender, "gender" {
        /// Male.
        Male => "MALE",
        /// Female.
        Female => "FEMALE",
        /// Other.
        Other => "OTHER",
        /// Not disclosed.
        Unknown => "UNKNOWN",
    }
}

tag_set! {
    /// Editorial status of an article.
    ArticleStatus, "article status" {
        /// Draft.
        Draft => "DRAFT",
        /// Published.
        Published => "PUBLISHED",
        /// Archived.
        Archived => "ARCHIVED",
    }
}

tag_set! {
    /// Media kind.
    MediaType, "media type" {
        /// Image.
        Image => "IMAGE",
        /// Video.
        Video => "VIDEO",
    }
}

tag_set! {
    /// Area a category applies to.
    CategoryType, "category type" {
        /// Articles.
        Article => "ARTICLE",
        /// Businesses.
        Business => "BUSINESS",
        /// Events.
        Event => "EVENT",
        /// Resources.
        Resource => "RESOURCE",
        /// Opportunities.
        Opportunity => "OPPORTUNITY",
    }
}

tag_set! {
    /// Kind of record owning an address.
    AddressOwnerType, "address owner type" {
        /// Business.
        Business => "BUSINESS",
        /// Event.
        Event => "EVENT",
        /// User.
        User => "USER",
    }
}

tag_set! {
    /// Scheduling status of an event.
    EventStatus, "event status" {
        /// Draft.
        Draft => "DRAFT",
        /// Upcoming.
        Upcoming => "UPCOMING",
        /// Ongoing.
        Ongoing => "ONGOING",
        /// Completed.
        Completed => "COMPLETED",
    }
}

tag_set! {
    /// Event format.
    EventType, "event type" {
        /// Workshops.
        Workshops => "WORKSHOPS",
        /// Webinars.
        Webinars => "WEBINARS",
        /// Conferences.
        Conferences => "CONFERENCES",
        /// Seminars.
        Seminars => "SEMINARS",
        /// Meetups.
        Meetups => "MEETUPS",
    }
}

tag_set! {
    /// Lifecycle state of an event registration.
    EventRegistrationStatus, "event registration status" {
        /// Awaiting confirmation.
        Pending => "PENDING",
        /// Seat reserved.
        Confirmed => "CONFIRMED",
        /// Cancelled by the attendee or organiser.
        Cancelled => "CANCELLED",
        /// Refunded.
        Refunded => "REFUNDED",
        /// Attendee checked in.
        CheckedIn => "CHECKED_IN",
        /// Attendee did not show up.
        NoShow => "NO_SHOW",
        /// Registration lapsed.
        Expired => "EXPIRED",
    }
}

tag_set! {
    /// Target kind of a rating.
    RatedItemType, "rated item type" {
        /// Business.
        Business => "BUSINESS",
        /// Professional.
        Professional => "PROFESSIONAL",
        /// Resource.
        Resource => "RESOURCE",
    }
}

tag_set! {
    /// Target kind of a reminder.
    RemindedItemType, "reminded item type" {
        /// Business.
        Business => "BUSINESS",
        /// Professional.
        Professional => "PROFESSIONAL",
        /// Resource.
        Resource => "RESOURCE",
    }
}

tag_set! {
    /// Target kind of a like.
    LikedItemType, "liked item type" {
        /// Business.
        Business => "BUSINESS",
        /// Article.
        Article => "ARTICLE",
        /// Resource.
        Resource => "RESOURCE",
    }
}

tag_set! {
    /// Target kind of a view.
    ViewedItemType, "viewed item type" {
        /// Business.
        Business => "BUSINESS",
        /// Professional.
        Professional => "PROFESSIONAL",
        /// Article.
        Article => "ARTICLE",
        /// Resource.
        Resource => "RESOURCE",
    }
}

tag_set! {
    /// Audience of a notification.
    NotificationType, "notification type" {
        /// General.
        General => "GENERAL",
        /// Personal.
        Personal => "PERSONAL",
        /// Promotional.
        Promotional => "PROMOTIONAL",
        /// Update.
        Update => "UPDATE",
    }
}

tag_set! {
    /// Kind of item a notification points at.
    NotificationRelatedItemType, "notification related item type" {
        /// Order.
        Order => "ORDER",
        /// Business.
        Business => "BUSINESS",
        /// Professional.
        Professional => "PROFESSIONAL",
        /// Resource.
        Resource => "RESOURCE",
        /// Article.
        Article => "ARTICLE",
        /// Anything else.
        Other => "OTHER",
    }
}

tag_set! {
    /// Delivery state of a notification.
    NotificationStatus, "notification status" {
        /// Waiting for dispatch.
        Pending => "PENDING",
        /// Handed to a channel.
        Sent => "SENT",
        /// Confirmed delivered.
        Delivered => "DELIVERED",
        /// Delivery failed.
        Failed => "FAILED",
        /// Read by the recipient.
        Read => "READ",
    }
}

tag_set! {
    /// Template used to render a notification.
    NotificationTemplateKey, "notification template key" {
        /// Invoice issued.
        InvoiceCreated => "INVOICE_CREATED",
        /// Invoice status changed.
        InvoiceStatusUpdated => "INVOICE_STATUS_UPDATED",
        /// Welcome message.
        UserWelcome => "USER_WELCOME",
        /// Security alert.
        UserAccountSecurityAlert => "USER_ACCOUNT_SECURITY_ALERT",
        /// Payment received.
        PaymentReceived => "PAYMENT_RECEIVED",
        /// Payment failed.
        PaymentFailed => "PAYMENT_FAILED",
        /// Article published.
        ContentArticlePublished => "CONTENT_ARTICLE_PUBLISHED",
        /// Service launch promotion.
        PromotionServiceLaunch => "PROMOTION_SERVICE_LAUNCH",
        /// Community event promotion.
        PromotionCommunityEvent => "PROMOTION_COMMUNITY_EVENT",
    }
}

impl NotificationTemplateKey {
    /// Returns the `templateData` keys the template interpolates.
    #[must_use]
    pub fn required_data_keys(&self) -> &'static [&'static str] {
        match self {
            Self::InvoiceCreated => &["invoiceNumber", "totalAmount", "dueDate"],
            Self::InvoiceStatusUpdated => &["invoiceNumber", "status"],
            Self::UserWelcome => &["firstName"],
            Self::UserAccountSecurityAlert => &["event", "occurredAt"],
            Self::PaymentReceived => &["invoiceNumber", "amount"],
            Self::PaymentFailed => &["invoiceNumber", "amount", "reason"],
            Self::ContentArticlePublished => &["articleTitle", "articleId"],
            Self::PromotionServiceLaunch => &["serviceName"],
            Self::PromotionCommunityEvent => &["eventTitle", "eventDate"],
        }
    }
}

tag_set! {
    /// Priority of a notification or reminder.
    Priority, "priority" {
        /// Low.
        Low => "LOW",
        /// Medium.
        Medium => "MEDIUM",
        /// High.
        High => "HIGH",
    }
}

tag_set! {
    /// Completion state of a reminder.
    ReminderStatus, "reminder status" {
        /// Pending.
        Pending => "PENDING",
        /// Completed.
        Completed => "COMPLETED",
        /// Skipped.
        Skipped => "SKIPPED",
    }
}

tag_set! {
    /// Recurrence of a reminder.
    RepeatType, "repeat type" {
        /// Once.
        Once => "NONE",
        /// Daily.
        Daily => "DAILY",
        /// Weekly.
        Weekly => "WEEKLY",
        /// Custom schedule.
        Custom => "CUSTOM",
    }
}

tag_set! {
    /// Role of a staff member inside a business.
    UserBusinessRole, "business staff role" {
        /// Administrator.
        Admin => "ADMIN",
        /// Manager.
        Manager => "MANAGER",
        /// Employee.
        Employee => "EMPLOYEE",
    }
}

tag_set! {
    /// Lifecycle state shared by resource and event orders.
    OrderStatus, "order status" {
        /// Placed, awaiting a decision.
        Pending => "PENDING",
        /// Fulfilled.
        Fulfilled => "FULFILLED",
        /// Cancelled.
        Cancelled => "CANCELLED",
        /// Rejected.
        Rejected => "REJECTED",
    }
}

tag_set! {
    /// Settlement state of an invoice.
    InvoiceStatus, "invoice status" {
        /// Fully paid.
        Paid => "PAID",
        /// Outstanding.
        Unpaid => "UNPAID",
        /// Outstanding past its due date.
        Overdue => "OVERDUE",
        /// Voided.
        Cancelled => "CANCELLED",
    }
}

tag_set! {
    /// Invoice payment terms.
    PaymentTermsType, "payment terms" {
        /// Due next day.
        Net1 => "NET_1",
        /// Due in seven days.
        Net7 => "NET_7",
        /// Due in thirty days.
        Net30 => "NET_30",
    }
}

impl PaymentTermsType {
    /// Returns the number of days until an invoice with these terms is due.
    #[must_use]
    pub fn days(&self) -> i64 {
        match self {
            Self::Net1 => 1,
            Self::Net7 => 7,
            Self::Net30 => 30,
        }
    }
}

tag_set! {
    /// Kind of stored payment method.
    PaymentMethodType, "payment method type" {
        /// Credit card.
        CreditCard => "CREDIT_CARD",
        /// Debit card.
        DebitCard => "DEBIT_CARD",
        /// Mobile money wallet.
        MobilePayment => "MOBILE_PAYMENT",
    }
}

impl PaymentMethodType {
    /// Returns true when the method carries card details.
    #[must_use]
    pub fn is_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

tag_set! {
    /// Card network.
    CardBrand, "card brand" {
        /// Mastercard.
        Mastercard => "MASTERCARD",
        /// Visa.
        Visa => "VISA",
    }
}

tag_set! {
    /// Mobile money provider.
    MobileProviderName, "mobile provider" {
        /// M-Pesa.
        MPesa => "M_PESA",
        /// e-Mola.
        EMola => "E_MOLA",
        /// mKesh.
        MKesh => "M_KESH",
    }
}

tag_set! {
    /// State of a resource order line item.
    ResourceItemStatus, "resource item status" {
        /// Pending.
        Pending => "PENDING",
        /// Active.
        Active => "ACTIVE",
        /// Cancelled.
        Cancelled => "CANCELLED",
        /// Refunded.
        Refunded => "REFUNDED",
        /// Expired.
        Expired => "EXPIRED",
        /// Failed.
        Failed => "FAILED",
        /// Suspended.
        Suspended => "SUSPENDED",
    }
}

tag_set! {
    /// Settlement state of a payment transaction.
    PaymentTransactionStatus, "payment transaction status" {
        /// Settled.
        Success => "SUCCESS",
        /// Declined or errored.
        Failed => "FAILED",
        /// Awaiting settlement.
        Pending => "PENDING",
        /// Reserved; no transition reaches it.
        Refunded => "REFUNDED",
    }
}

tag_set! {
    /// Order kind an invoice bills.
    InvoiceSourceType, "invoice source type" {
        /// Resource order.
        ResourceOrder => "RESOURCE_ORDER",
        /// Event order.
        EventOrder => "EVENT_ORDER",
    }
}

tag_set! {
    /// Kind of opportunity.
    OpportunityType, "opportunity type" {
        /// Competition.
        Competition => "COMPETITION",
        /// Job vacancy.
        Vacancy => "VACANCY",
        /// Scholarship.
        Scholarship => "SCHOLARSHIP",
        /// Funding call.
        Fund => "FUND",
    }
}

tag_set! {
    /// Publication state of an opportunity.
    OpportunityStatus, "opportunity status" {
        /// Draft.
        Draft => "DRAFT",
        /// Open.
        Open => "OPEN",
        /// Closed.
        Closed => "CLOSED",
        /// Archived.
        Archived => "ARCHIVED",
    }
}
