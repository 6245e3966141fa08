use contend_network::{ChannelSession, SessionOptions};
use contend_test_helpers::Arbiter;

pub(crate) async fn session_for(arbiter: &Arbiter) -> ChannelSession {
    ChannelSession::connect(&arbiter.host(), arbiter.port(), SessionOptions::default())
        .await
        .expect("connect failed")
}
