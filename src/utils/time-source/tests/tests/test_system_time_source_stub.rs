// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::FutureExt;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test]
fn test_now_follows_set_and_advance() {
    let time_source = SystemTimeSourceStub::new_set(t(0));
    assert_eq!(time_source.now(), t(0));

    time_source.advance(Duration::seconds(30));
    assert_eq!(time_source.now(), t(30));

    time_source.set(t(100));
    assert_eq!(time_source.now(), t(100));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_sleep_wakes_up_only_when_due() {
    let time_source = SystemTimeSourceStub::new_set(t(0));

    let mut sleep = Box::pin(time_source.sleep(Duration::seconds(10)));
    assert!((&mut sleep).now_or_never().is_none());
    assert_eq!(time_source.awaiting_callers_count(), 1);

    time_source.advance(Duration::seconds(5));
    assert!((&mut sleep).now_or_never().is_none());

    time_source.advance(Duration::seconds(5));
    assert!((&mut sleep).now_or_never().is_some());
    assert_eq!(time_source.awaiting_callers_count(), 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_zero_sleep_completes_immediately() {
    let time_source = SystemTimeSourceStub::new_set(t(0));

    time_source.sleep(Duration::zero()).await;

    assert_eq!(time_source.awaiting_callers_count(), 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
