pub const EMERGENCY_REPLY: &str =
    "Namaste. Emergency alert simulated — family notified (simulation).";
pub const EMERGENCY_MESSAGE: &str = "Emergency simulated. Family notified (simulation).";
pub const GREETING_REPLY: &str = "Namaste. Main aapki madad ke liye yahan hoon.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAction {
    SetReminder,
    Emergency,
    Greeting,
}

pub fn make_reply(action: ReplyAction, reminder_text: Option<&str>) -> String {
    match action {
        ReplyAction::SetReminder => format!(
            "Namaste. Main aapka reminder set kar diya hoon: {}.",
            reminder_text.unwrap_or_default()
        ),
        ReplyAction::Emergency => EMERGENCY_REPLY.to_string(),
        ReplyAction::Greeting => GREETING_REPLY.to_string(),
    }
}
