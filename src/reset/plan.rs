//! Static reset plan: which objects get deleted, in what order, and which
//! snapshots repopulate the environment.
//!
//! The dependency order lives here as data rather than control flow. Tiers run
//! strictly in sequence, leaf records first, so child records are gone before
//! their parents are deleted.

// ─────────────────────────────────────────────────────────────────────────────
// Deletion tiers
// ─────────────────────────────────────────────────────────────────────────────

/// One rung of the deletion ladder. Objects within a tier are independent of
/// each other; the tier as a whole must finish before the next one starts.
#[derive(Debug, Clone, Copy)]
pub struct DeletionTier {
    /// Salesforce object API names deleted in this tier.
    pub objects: &'static [&'static str],
}

/// Deletion order, leaf → root. Account rows go last because everything else
/// hangs off them.
pub const DELETION_TIERS: &[DeletionTier] = &[
    DeletionTier {
        objects: &[
            "Task",
            "Event",
            "Archived_Note__c",
            "InsurancePolicyParticipant",
            "AccountContactRelation",
            "AssociatedLocation",
            "ContactPointEmail",
            "ContactPointPhone",
            "Opportunity",
            "Claim",
        ],
    },
    DeletionTier {
        objects: &[
            "Producer",
            "InsurancePolicy",
            "Location",
            "Lead",
            "Contact",
        ],
    },
    DeletionTier {
        objects: &["Account"],
    },
];

// ─────────────────────────────────────────────────────────────────────────────
// Upsert batch
// ─────────────────────────────────────────────────────────────────────────────

/// One object restored from a named static-resource snapshot.
#[derive(Debug, Clone, Copy)]
pub struct UpsertTarget {
    /// Salesforce object API name.
    pub object: &'static str,
    /// Static resource holding the canned records.
    pub snapshot: &'static str,
}

/// Everything repopulated after a reset, issued as one concurrent batch.
/// The four account flavors are record types of Account with their own
/// snapshots.
pub const UPSERT_TARGETS: &[UpsertTarget] = &[
    UpsertTarget {
        object: "Archived_Note__c",
        snapshot: "Training_ArchivedNotes",
    },
    UpsertTarget {
        object: "Account",
        snapshot: "Training_HouseholdAccounts",
    },
    UpsertTarget {
        object: "Account",
        snapshot: "Training_IndividualAccounts",
    },
    UpsertTarget {
        object: "Account",
        snapshot: "Training_UserAccounts",
    },
    UpsertTarget {
        object: "Account",
        snapshot: "Training_BusinessAccounts",
    },
    UpsertTarget {
        object: "Claim",
        snapshot: "Training_Claims",
    },
    UpsertTarget {
        object: "Location",
        snapshot: "Training_Locations",
    },
    UpsertTarget {
        object: "Lead",
        snapshot: "Training_Leads",
    },
    UpsertTarget {
        object: "Contact",
        snapshot: "Training_Contacts",
    },
    UpsertTarget {
        object: "InsurancePolicy",
        snapshot: "Training_InsurancePolicies",
    },
    UpsertTarget {
        object: "Producer",
        snapshot: "Training_Producers",
    },
    UpsertTarget {
        object: "Opportunity",
        snapshot: "Training_Opportunities",
    },
    UpsertTarget {
        object: "InsurancePolicyParticipant",
        snapshot: "Training_InsurancePolicyParticipants",
    },
    UpsertTarget {
        object: "ContactPointEmail",
        snapshot: "Training_ContactPointEmails",
    },
    UpsertTarget {
        object: "ContactPointPhone",
        snapshot: "Training_ContactPointPhones",
    },
    UpsertTarget {
        object: "AccountContactRelation",
        snapshot: "Training_AccountContactRelations",
    },
    UpsertTarget {
        object: "AssociatedLocation",
        snapshot: "Training_AssociatedLocations",
    },
    UpsertTarget {
        object: "Task",
        snapshot: "Training_Tasks",
    },
    UpsertTarget {
        object: "Event",
        snapshot: "Training_Events",
    },
];

/// Total delete submissions across all tiers.
pub fn delete_count() -> usize {
    DELETION_TIERS.iter().map(|t| t.objects.len()).sum()
}
