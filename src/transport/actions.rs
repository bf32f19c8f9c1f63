//! Wire encoders: one provider action → one [`ApiRequest`].

use crate::domain::{Action, ApiRequest, OrderId, OrderParams, RefillId, ServiceId, join_ids};

const ORDERS_FIELD: &str = "orders";
const REFILLS_FIELD: &str = "refills";

pub fn encode_order(params: &OrderParams) -> ApiRequest {
    let options = params.options();
    let mut request = ApiRequest::new(Action::Add)
        .field(ServiceId::FIELD, params.service().as_str())
        .field(OrderParams::LINK_FIELD, params.link());

    let numeric = [
        ("quantity", options.quantity),
        ("runs", options.runs.map(u64::from)),
        ("interval", options.interval.map(u64::from)),
    ];
    for (name, value) in numeric {
        if let Some(value) = value {
            request = request.field(name, value.to_string());
        }
    }

    let text = [
        ("comments", &options.comments),
        ("keywords", &options.keywords),
        ("hashtag", &options.hashtag),
        ("username", &options.username),
    ];
    for (name, value) in text {
        if let Some(value) = value {
            request = request.field(name, value.as_str());
        }
    }

    let subscription = [
        ("min", options.min),
        ("max", options.max),
        ("posts", options.posts.map(u64::from)),
        ("old_posts", options.old_posts.map(u64::from)),
        ("delay", options.delay.map(u64::from)),
    ];
    for (name, value) in subscription {
        if let Some(value) = value {
            request = request.field(name, value.to_string());
        }
    }

    if let Some(expiry) = &options.expiry {
        request = request.field("expiry", expiry.as_str());
    }
    if let Some(answer_number) = &options.answer_number {
        request = request.field("answer_number", answer_number.as_str());
    }

    request
}

pub fn encode_status(order: &OrderId) -> ApiRequest {
    ApiRequest::new(Action::Status).field(OrderId::FIELD, order.as_str())
}

pub fn encode_multi_status(orders: &[OrderId]) -> ApiRequest {
    ApiRequest::new(Action::Status).field(ORDERS_FIELD, join_ids(orders))
}

pub fn encode_services() -> ApiRequest {
    ApiRequest::new(Action::Services)
}

pub fn encode_refill(order: &OrderId) -> ApiRequest {
    ApiRequest::new(Action::Refill).field(OrderId::FIELD, order.as_str())
}

pub fn encode_multi_refill(orders: &[OrderId]) -> ApiRequest {
    ApiRequest::new(Action::Refill).field(ORDERS_FIELD, join_ids(orders))
}

pub fn encode_refill_status(refill: &RefillId) -> ApiRequest {
    ApiRequest::new(Action::RefillStatus).field(RefillId::FIELD, refill.as_str())
}

pub fn encode_multi_refill_status(refills: &[RefillId]) -> ApiRequest {
    ApiRequest::new(Action::RefillStatus).field(REFILLS_FIELD, join_ids(refills))
}

pub fn encode_cancel(orders: &[OrderId]) -> ApiRequest {
    ApiRequest::new(Action::Cancel).field(ORDERS_FIELD, join_ids(orders))
}

pub fn encode_balance() -> ApiRequest {
    ApiRequest::new(Action::Balance)
}
