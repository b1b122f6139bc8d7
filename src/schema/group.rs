//! Group object class descriptor.
//!
//! Declares every Group attribute the remote directory exposes, which ones are
//! required on create, which are server-managed, and which multi-valued fields
//! can only be written as complete arrays.

use super::types::{AttributeInfo, AttributeType, ObjectClassInfo, PatchSemantics};

pub const GROUP_OBJECT_CLASS: &str = "Group";

/// Collection path of groups on the remote API.
pub const GROUPS_PATH: &str = "/groups";

pub const ATTR_ALLOW_EXTERNAL_SENDERS: &str = "allowExternalSenders";
pub const ATTR_AUTO_SUBSCRIBE_NEW_MEMBERS: &str = "autoSubscribeNewMembers";
pub const ATTR_CLASSIFICATION: &str = "classification";
pub const ATTR_CREATED_DATE_TIME: &str = "createdDateTime";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_DISPLAY_NAME: &str = "displayName";
pub const ATTR_GROUP_TYPES: &str = "groupTypes";
pub const ATTR_ID: &str = "id";
pub const ATTR_IS_SUBSCRIBED_BY_MAIL: &str = "isSubscribedByMail";
pub const ATTR_MAIL: &str = "mail";
pub const ATTR_MAIL_ENABLED: &str = "mailEnabled";
pub const ATTR_MAIL_NICKNAME: &str = "mailNickname";
pub const ATTR_MEMBERSHIP_RULE: &str = "membershipRule";
pub const ATTR_MEMBERSHIP_RULE_PROCESSING_STATE: &str = "membershipRuleProcessingState";
pub const ATTR_ON_PREMISES_LAST_SYNC_DATE_TIME: &str = "onPremisesLastSyncDateTime";
pub const ATTR_ON_PREMISES_SECURITY_IDENTIFIER: &str = "onPremisesSecurityIdentifier";
pub const ATTR_ON_PREMISES_SYNC_ENABLED: &str = "onPremisesSyncEnabled";
pub const ATTR_PROXY_ADDRESSES: &str = "proxyAddresses";
pub const ATTR_SECURITY_ENABLED: &str = "securityEnabled";
pub const ATTR_UNSEEN_COUNT: &str = "unseenCount";
pub const ATTR_VISIBILITY: &str = "visibility";
pub const ATTR_MEMBERS: &str = "members";
pub const ATTR_OWNERS: &str = "owners";

/// Build the Group object class.
pub fn group_object_class() -> ObjectClassInfo {
    use AttributeType::{Boolean, DateTime, Integer};

    let attributes = vec![
        // required
        AttributeInfo::builder(ATTR_DISPLAY_NAME).required().build(),
        AttributeInfo::builder(ATTR_MAIL_ENABLED)
            .data_type(Boolean)
            .required()
            .build(),
        AttributeInfo::builder(ATTR_MAIL_NICKNAME).required().build(),
        AttributeInfo::builder(ATTR_SECURITY_ENABLED)
            .data_type(Boolean)
            .required()
            .build(),
        // optional
        AttributeInfo::builder(ATTR_ALLOW_EXTERNAL_SENDERS)
            .data_type(Boolean)
            .build(),
        AttributeInfo::builder(ATTR_AUTO_SUBSCRIBE_NEW_MEMBERS)
            .data_type(Boolean)
            .build(),
        AttributeInfo::builder(ATTR_CLASSIFICATION).build(),
        AttributeInfo::builder(ATTR_CREATED_DATE_TIME)
            .data_type(DateTime)
            .read_only()
            .build(),
        AttributeInfo::builder(ATTR_DESCRIPTION).build(),
        AttributeInfo::builder(ATTR_GROUP_TYPES)
            .multi_valued()
            .patch_semantics(PatchSemantics::ReplaceOnly)
            .build(),
        AttributeInfo::builder(ATTR_MEMBERSHIP_RULE).build(),
        AttributeInfo::builder(ATTR_MEMBERSHIP_RULE_PROCESSING_STATE).build(),
        AttributeInfo::builder(ATTR_ID).read_only().build(),
        AttributeInfo::builder(ATTR_IS_SUBSCRIBED_BY_MAIL)
            .data_type(Boolean)
            .build(),
        AttributeInfo::builder(ATTR_MAIL).read_only().build(),
        AttributeInfo::builder(ATTR_ON_PREMISES_LAST_SYNC_DATE_TIME)
            .data_type(DateTime)
            .read_only()
            .build(),
        AttributeInfo::builder(ATTR_ON_PREMISES_SECURITY_IDENTIFIER)
            .read_only()
            .build(),
        AttributeInfo::builder(ATTR_ON_PREMISES_SYNC_ENABLED)
            .data_type(Boolean)
            .read_only()
            .build(),
        AttributeInfo::builder(ATTR_PROXY_ADDRESSES)
            .multi_valued()
            .read_only()
            .build(),
        AttributeInfo::builder(ATTR_UNSEEN_COUNT)
            .data_type(Integer)
            .build(),
        AttributeInfo::builder(ATTR_VISIBILITY).build(),
        // relationships
        AttributeInfo::builder(ATTR_MEMBERS)
            .multi_valued()
            .not_returned_by_default()
            .patch_semantics(PatchSemantics::Reference)
            .build(),
        AttributeInfo::builder(ATTR_OWNERS)
            .multi_valued()
            .not_returned_by_default()
            .patch_semantics(PatchSemantics::Reference)
            .build(),
    ];

    ObjectClassInfo {
        type_name: GROUP_OBJECT_CLASS.to_string(),
        attributes,
    }
}
