use household_core::{
    FetchHouseholdsRequest, FetchHouseholdsResponse, Household, HouseholdFields, Member, MemberId,
    MemberRecord, Relationship,
};
use serde_json::json;

#[test]
fn household_fields_use_camel_case_keys() {
    let fields = HouseholdFields {
        zip_code: "1000001".to_string(),
        address: "Tokyo".to_string(),
        phone_number: "09012345678".to_string(),
        email: "a@b.co".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&fields).unwrap(),
        json!({
            "zipCode": "1000001",
            "address": "Tokyo",
            "phoneNumber": "09012345678",
            "email": "a@b.co"
        })
    );
}

#[test]
fn search_response_decodes_with_optional_name() {
    let raw = json!({
        "count": 2,
        "households": [
            {
                "uid": "H1",
                "name": "山田 太郎",
                "zipCode": "1000001",
                "address": "Tokyo",
                "phoneNumber": "0311111111",
                "email": "one@example.com",
                "created": "2024-01-01T00:00:00.000Z",
                "updated": "2024-01-02T00:00:00.000Z"
            },
            {
                "uid": "H2",
                "zipCode": "1000002",
                "address": "Osaka",
                "phoneNumber": "0622222222",
                "email": "two@example.com",
                "created": "2024-01-01T00:00:00.000Z",
                "updated": "2024-01-01T00:00:00.000Z"
            }
        ]
    });
    let response: FetchHouseholdsResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(response.count, 2);
    assert_eq!(response.households[0].name.as_deref(), Some("山田 太郎"));
    assert_eq!(response.households[1].name, None);

    let household: &Household = &response.households[1];
    assert_eq!(household.fields().address, "Osaka");
}

#[test]
fn search_request_serializes_paging() {
    let request = FetchHouseholdsRequest::new("example", 10, 5);
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({ "search": "example", "offset": 10, "limit": 5 })
    );
}

#[test]
fn created_member_is_sent_without_uid() {
    let mut member = Member::empty();
    member.family_name = "山田".to_string();
    member.given_name = "太郎".to_string();
    member.birthday = "1990-01-21".to_string();
    member.relationship = Some(Relationship::Head);

    let value = serde_json::to_value(member.to_record("H1", true)).unwrap();
    assert_eq!(
        value,
        json!({
            "householdUid": "H1",
            "familyName": "山田",
            "givenName": "太郎",
            "birthday": "1990-01-21",
            "relationship": "本人"
        })
    );
}

#[test]
fn persisted_member_keeps_uid_only_when_requested() {
    let mut member = Member::with_id(MemberId::persisted("M1"));
    member.relationship = Some(Relationship::Spouse);

    let sent = serde_json::to_value(member.to_record("H1", true)).unwrap();
    assert_eq!(sent["uid"], "M1");
    assert_eq!(sent["relationship"], "配偶者");

    let stripped = serde_json::to_value(member.to_record("H1", false)).unwrap();
    assert!(stripped.get("uid").is_none());
}

#[test]
fn unknown_relationship_decodes_as_unset() {
    let raw = json!({
        "uid": "M1",
        "householdUid": "H1",
        "familyName": "山田",
        "givenName": "太郎",
        "birthday": "1990-01-21",
        "relationship": "友人"
    });
    let record: MemberRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(record.relationship, None);

    let member = Member::from_record(record).unwrap();
    assert_eq!(member.id, MemberId::persisted("M1"));
    assert_eq!(member.relationship, None);
}

#[test]
fn record_without_uid_is_not_a_member() {
    let raw = json!({
        "householdUid": "H1",
        "familyName": "山田",
        "givenName": "太郎",
        "birthday": "1990-01-21",
        "relationship": "子"
    });
    let record: MemberRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(record.relationship, Some(Relationship::Child));
    assert!(Member::from_record(record).is_none());
}
