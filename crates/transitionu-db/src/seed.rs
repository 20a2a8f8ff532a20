//! Starter content for a fresh install: checklist structure, FAQ entries,
//! achievements and setup guides. Idempotent (INSERT OR IGNORE on fixed
//! ids), invoked by the server after the schema is in place — tests get a
//! clean database without it.

use anyhow::Result;
use tracing::info;

use crate::Database;

impl Database {
    pub fn seed(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                r#"
                INSERT OR IGNORE INTO checklist_categories (id, name, description, display_order) VALUES
                    ('10000000-0000-0000-0000-000000000001', 'Pre-arrival', 'Before you leave home', 1),
                    ('10000000-0000-0000-0000-000000000002', 'First week', 'Settling in on campus', 2),
                    ('10000000-0000-0000-0000-000000000003', 'First semester', 'Finding your rhythm', 3);

                INSERT OR IGNORE INTO checklist_items
                    (id, category_id, title, description, estimated_time, difficulty,
                     display_order, required, visa_specific, visa_types, resources) VALUES
                    ('20000000-0000-0000-0000-000000000001', '10000000-0000-0000-0000-000000000001',
                     'Apply for Student Visa', 'Gather documents and submit your application', '2-8 weeks', 'Hard',
                     1, 1, 0, NULL, NULL),
                    ('20000000-0000-0000-0000-000000000002', '10000000-0000-0000-0000-000000000001',
                     'Pay SEVIS Fee', 'Required before your visa interview', '30 minutes', 'Easy',
                     2, 1, 1, '["F-1","M-1"]',
                     '[{"type":"link","title":"SEVIS fee payment","url":"https://www.fmjfee.com"}]'),
                    ('20000000-0000-0000-0000-000000000003', '10000000-0000-0000-0000-000000000001',
                     'Obtain DS-2019', 'Exchange visitor eligibility form from your sponsor', '1-2 weeks', 'Medium',
                     3, 1, 1, '["J-1"]', NULL),
                    ('20000000-0000-0000-0000-000000000004', '10000000-0000-0000-0000-000000000002',
                     'Open Local Bank Account', 'Compare banks and open an account', '1 day', 'Medium',
                     1, 1, 0, NULL, NULL),
                    ('20000000-0000-0000-0000-000000000005', '10000000-0000-0000-0000-000000000002',
                     'Get Local SIM Card', 'Find a mobile plan and get a SIM', '1 hour', 'Easy',
                     2, 0, 0, NULL, NULL),
                    ('20000000-0000-0000-0000-000000000006', '10000000-0000-0000-0000-000000000003',
                     'Register for Classes', 'Select courses and complete registration', '2 hours', 'Medium',
                     1, 1, 0, NULL, NULL);

                INSERT OR IGNORE INTO faq_items (id, question, answer, category, keywords) VALUES
                    ('30000000-0000-0000-0000-000000000001',
                     'How early should I apply for my visa?',
                     'Start as soon as you receive your admission letter; appointments can take weeks.',
                     'visa', '["visa-related topics","interview","embassy"]'),
                    ('30000000-0000-0000-0000-000000000002',
                     'Can I work on campus?',
                     'Most student visas allow limited on-campus work; check with your international office.',
                     'work', '["employment","on-campus","hours"]'),
                    ('30000000-0000-0000-0000-000000000003',
                     'How do I find housing before arriving?',
                     'University housing portals and verified student groups are the safest options.',
                     'housing', '["housing","dorm","lease"]');

                INSERT OR IGNORE INTO achievements (id, title, description, icon_name, category, points, requirements) VALUES
                    ('40000000-0000-0000-0000-000000000001', 'First Steps',
                     'Complete your first checklist item', 'footprints', 'pre-arrival', 10,
                     '{"type":"checklist_items_completed","count":1}'),
                    ('40000000-0000-0000-0000-000000000002', 'Halfway There',
                     'Complete five checklist items', 'flag', 'post-arrival', 25,
                     '{"type":"checklist_items_completed","count":5}'),
                    ('40000000-0000-0000-0000-000000000003', 'Conversation Starter',
                     'Create your first forum post', 'chat', 'community', 10,
                     '{"type":"forum_posts_created","count":1}'),
                    ('40000000-0000-0000-0000-000000000004', 'Helping Hand',
                     'Reply to three forum posts', 'hand', 'community', 15,
                     '{"type":"replies_posted","count":3}');

                INSERT OR IGNORE INTO setup_guide_categories (id, name, description, icon_name, display_order) VALUES
                    ('50000000-0000-0000-0000-000000000001', 'Banking', 'Accounts, cards and transfers', 'bank', 1),
                    ('50000000-0000-0000-0000-000000000002', 'Phone & Internet', 'Staying connected', 'phone', 2);

                INSERT OR IGNORE INTO setup_guides
                    (id, category_id, title, content, institution_specific, institutions,
                     major_specific, majors, display_order, resources) VALUES
                    ('60000000-0000-0000-0000-000000000001', '50000000-0000-0000-0000-000000000001',
                     'Opening your first account',
                     'Bring your passport, I-20 or DS-2019, and proof of enrollment to a local branch.',
                     0, NULL, 0, NULL, 1, NULL),
                    ('60000000-0000-0000-0000-000000000002', '50000000-0000-0000-0000-000000000002',
                     'Choosing a phone plan',
                     'Prepaid plans need no credit history; compare coverage near campus first.',
                     0, NULL, 0, NULL, 1, NULL);
                "#,
            )?;
            Ok(())
        })?;

        info!("Seed content ensured");
        Ok(())
    }
}
