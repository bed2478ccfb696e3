//! Offline demo: an in-process service with a scripted counterpart.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use orderchat_client::MemoryBackend;
use orderchat_core::{
    detect_language, MessageType, NewChatMessage, ReservationNumber, SenderRole, UserId,
};

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_USER_NAME: &str = "데모 고객";

const STAFF_ID: &str = "demo-staff";
const STAFF_NAME: &str = "王芳";

/// Opening exchange already in the log when the demo starts.
const HISTORY: &[(bool, &str)] = &[
    (true, "안녕하세요, 이우 시장 조사 건으로 문의드립니다."),
    (false, "您好！我是负责您订单的王芳。请问您需要调查哪些产品？"),
    (true, "주방용품 위주로 공장 세 곳 정도 비교해 주세요."),
];

/// Lines the counterpart sends while the demo runs.
const SCRIPT: &[&str] = &[
    "好的，我们明天上午去市场。",
    "已经联系了两家工厂，报价稍后发给您。",
    "第三家工厂下周可以安排验货。",
];

fn message(
    reservation: &ReservationNumber,
    sender_id: &str,
    sender_name: &str,
    sender_role: SenderRole,
    text: &str,
) -> NewChatMessage {
    NewChatMessage {
        reservation_number: reservation.clone(),
        sender_id: UserId::new(sender_id),
        sender_name: sender_name.to_string(),
        sender_role,
        original_message: text.to_string(),
        original_language: detect_language(text),
        message_type: MessageType::Text,
        service_type: Some("market-research".to_string()),
        is_read: false,
    }
}

/// Put a short conversation into the log of `reservation`.
pub fn seed_history(memory: &MemoryBackend, reservation: &ReservationNumber) {
    for (from_customer, text) in HISTORY {
        let row = if *from_customer {
            message(
                reservation,
                DEMO_USER_ID,
                DEMO_USER_NAME,
                SenderRole::Customer,
                text,
            )
        } else {
            message(
                reservation,
                STAFF_ID,
                STAFF_NAME,
                SenderRole::ChineseStaff,
                text,
            )
        };
        memory.insert_external(row);
    }
    debug!(reservation = %reservation, rows = HISTORY.len(), "Seeded demo history");
}

/// Send the scripted staff lines, one every `interval`.
pub async fn run_counterpart(
    memory: Arc<MemoryBackend>,
    reservation: ReservationNumber,
    interval: Duration,
) {
    info!(reservation = %reservation, "Demo counterpart started");
    for text in SCRIPT {
        tokio::time::sleep(interval).await;
        let row = memory.insert_external(message(
            &reservation,
            STAFF_ID,
            STAFF_NAME,
            SenderRole::ChineseStaff,
            text,
        ));
        debug!(message_id = %row.id, "Demo counterpart sent a message");
    }
    info!("Demo counterpart finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderchat_core::Language;

    fn rn() -> ReservationNumber {
        ReservationNumber::parse("DL-2024-0001").unwrap()
    }

    #[test]
    fn test_seed_history_alternates_languages() {
        let memory = MemoryBackend::new();
        seed_history(&memory, &rn());

        let rows = memory.rows(&rn());
        assert_eq!(rows.len(), HISTORY.len());
        assert_eq!(rows[0].original_language, Language::Ko);
        assert_eq!(rows[1].original_language, Language::Zh);
        assert_eq!(rows[1].sender_role, SenderRole::ChineseStaff);
        assert!(rows.iter().all(|row| row.translated_message.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_counterpart_sends_whole_script() {
        let memory = Arc::new(MemoryBackend::new());
        run_counterpart(memory.clone(), rn(), Duration::from_secs(3)).await;

        let rows = memory.rows(&rn());
        assert_eq!(rows.len(), SCRIPT.len());
        assert!(rows
            .iter()
            .all(|row| row.original_language == Language::Zh
                && row.sender_id == Some(UserId::new(STAFF_ID))));
    }
}
