// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_stamps_name_body_and_creation_time() {
    let template = Template::new("router", "route: {{message}}", 1000);
    assert_eq!(template.name, "router");
    assert_eq!(template.body, "route: {{message}}");
    assert_eq!(template.created_at_ms, 1000);
}
