#[cfg(test)]
mod lead_workflow_integration_tests {
    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use diesel::connection::SimpleConnection;
    use diesel::prelude::*;
    use diesel::PgConnection;
    use std::sync::OnceLock;
    use uuid::Uuid;

    use leadserver::config::WorkflowConfig;
    use leadserver::leads::checkout;
    use leadserver::leads::disposition;
    use leadserver::leads::error::WorkflowError;
    use leadserver::leads::import;
    use leadserver::leads::selection;
    use leadserver::leads::stats;
    use leadserver::leads::types::{
        ApplianceItemInput, CreateLeadRequest, DispositionOutcome, ImportLeadsRequest,
        LeadImportRecord,
    };
    use leadserver::shared::schema::{
        import_batches, lead_dispositions, lead_sale_links, leads, sale_appliance_items, sales,
    };
    use leadserver::shared::utils::{create_conn, run_migrations, DbPool};

    static SETUP: OnceLock<Option<DbPool>> = OnceLock::new();

    /// Shared pool with migrations applied once. Returns None when Postgres is
    /// not reachable so every test can skip instead of failing.
    fn test_pool() -> Option<DbPool> {
        SETUP
            .get_or_init(|| {
                let database_url = std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://leads:@localhost:5432/leadserver".to_string());
                if PgConnection::establish(&database_url).is_err() {
                    println!("Skipping test - Postgres not available");
                    return None;
                }
                let pool = match create_conn(&database_url, 2) {
                    Ok(pool) => pool,
                    Err(e) => {
                        println!("Skipping test - cannot create pool: {}", e);
                        return None;
                    }
                };
                if let Err(e) = run_migrations(&pool) {
                    println!("Skipping test - migrations failed: {}", e);
                    return None;
                }
                Some(pool)
            })
            .clone()
    }

    fn workflow() -> WorkflowConfig {
        WorkflowConfig {
            checkout_ttl_minutes: 30,
            selection_batch: 25,
            callback_horizon_days: 60,
            callback_grace_minutes: 5,
        }
    }

    fn record(first: &str, last: &str, phone: &str) -> LeadImportRecord {
        LeadImportRecord {
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: phone.to_string(),
            email: None,
            address_line1: None,
            address_line2: None,
            city: None,
            postcode: None,
            boiler_cover: None,
            boiler_cover_price: None,
            appliance_items: None,
        }
    }

    fn cleanup(conn: &mut PgConnection, agent_ids: &[Uuid], batch_id: Option<Uuid>) {
        let _ = diesel::delete(sales::table.filter(sales::agent_id.eq_any(agent_ids.to_vec())))
            .execute(conn);
        let _ = diesel::delete(
            leads::table.filter(leads::assigned_agent_id.eq_any(agent_ids.to_vec())),
        )
        .execute(conn);
        if let Some(batch_id) = batch_id {
            let _ = diesel::delete(import_batches::table.filter(import_batches::id.eq(batch_id)))
                .execute(conn);
        }
    }

    #[test]
    fn test_import_checkout_and_no_answer_cycle() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: Some("cycle test".to_string()),
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![
                record("Nia", "Edwards", "07700900001"),
                record("Owen", "Hart", "07700900002"),
            ],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();
        assert_eq!(imported.imported, 2);

        let first = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let first_lead = first.lead.unwrap();
        assert_eq!(first_lead.status, "new");
        assert_eq!(first_lead.checked_out_by, Some(agent));
        assert!(first_lead.checked_out_at.is_some());
        assert!(first.has_more);

        let applied = disposition::apply_disposition(
            &mut conn,
            first_lead.id,
            agent,
            DispositionOutcome::CalledNoAnswer,
            Some("no pickup".to_string()),
            None,
            &workflow(),
        )
        .unwrap();
        assert_eq!(applied.lead.status, "called_no_answer");
        assert_eq!(applied.lead.times_contacted, 1);
        assert!(applied.lead.checked_out_by.is_none());
        assert!(applied.lead.last_contact_attempt_at.is_some());
        assert_eq!(applied.lead.last_disposition_by, Some(agent));
        assert!(applied.sale.is_none());

        let history: Vec<(String, Option<String>)> = lead_dispositions::table
            .filter(lead_dispositions::lead_id.eq(first_lead.id))
            .select((lead_dispositions::status, lead_dispositions::notes))
            .load(&mut conn)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, "called_no_answer");
        assert_eq!(history[0].1.as_deref(), Some("no pickup"));

        // Never-contacted lead outranks the one just attempted.
        let second = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let second_lead = second.lead.unwrap();
        assert_ne!(second_lead.id, first_lead.id);
        assert_eq!(second_lead.status, "new");
        assert!(second.has_more);

        let released = checkout::release(&mut conn, second_lead.id, agent, Utc::now()).unwrap();
        assert!(released);
        let released_again =
            checkout::release(&mut conn, second_lead.id, agent, Utc::now()).unwrap();
        assert!(!released_again);

        let counters = stats::agent_stats(&mut conn, agent, Utc::now()).unwrap();
        assert_eq!(counters.total_assigned, 2);
        assert_eq!(counters.new_leads, 1);
        assert_eq!(counters.no_answer, 1);
        assert_eq!(counters.callbacks_due, 0);
        assert_eq!(counters.callbacks_scheduled, 0);
        assert_eq!(counters.contacted, 1);

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_due_callback_outranks_fresh_leads() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![
                record("Carys", "Lloyd", "07700900003"),
                record("Dylan", "Rees", "07700900004"),
            ],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        let ids: Vec<Uuid> = leads::table
            .filter(leads::assigned_agent_id.eq(agent))
            .select(leads::id)
            .load(&mut conn)
            .unwrap();
        let callback_lead = ids[0];
        let fresh_lead = ids[1];

        diesel::update(leads::table.filter(leads::id.eq(callback_lead)))
            .set((
                leads::status.eq("callback"),
                leads::callback_at.eq(Utc::now() - Duration::minutes(10)),
            ))
            .execute(&mut conn)
            .unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let picked = outcome.lead.unwrap();
        assert_eq!(picked.id, callback_lead);
        assert!(outcome.has_more);

        // Push the callback into the future; the fresh lead is served instead.
        let applied = disposition::apply_disposition(
            &mut conn,
            callback_lead,
            agent,
            DispositionOutcome::Callback,
            None,
            Some(Utc::now() + Duration::days(1)),
            &workflow(),
        )
        .unwrap();
        assert_eq!(applied.lead.status, "callback");
        assert!(applied.lead.callback_at.is_some());

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let picked = outcome.lead.unwrap();
        assert_eq!(picked.id, fresh_lead);
        assert!(!outcome.has_more);

        let counters = stats::agent_stats(&mut conn, agent, Utc::now()).unwrap();
        assert_eq!(counters.callbacks_scheduled, 1);
        assert_eq!(counters.callbacks_due, 0);

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_sale_disposition_creates_sale_and_link() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let mut sale_record = record("Ffion", "Morgan", "07700900005");
        sale_record.boiler_cover = Some(true);
        sale_record.boiler_cover_price = Some("10.00".parse::<BigDecimal>().unwrap());
        sale_record.appliance_items = Some(vec![
            ApplianceItemInput {
                appliance_type: "washing_machine".to_string(),
                brand: Some("Bosch".to_string()),
                cover_limit: Some("500".parse::<BigDecimal>().unwrap()),
                monthly_cost: "3.50".parse::<BigDecimal>().unwrap(),
            },
            ApplianceItemInput {
                appliance_type: "dishwasher".to_string(),
                brand: None,
                cover_limit: None,
                monthly_cost: "4.25".parse::<BigDecimal>().unwrap(),
            },
        ]);
        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![sale_record],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let lead = outcome.lead.unwrap();
        assert_eq!(lead.monthly_total, "17.75".parse::<BigDecimal>().unwrap());

        let before = Utc::now();
        let applied = disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::SaleMade,
            Some("signed up on the call".to_string()),
            None,
            &workflow(),
        )
        .unwrap();
        let after = Utc::now();

        assert_eq!(applied.lead.status, "sale_made");
        assert!(applied.lead.checked_out_by.is_none());
        let sale = applied.sale.unwrap();
        assert_eq!(sale.monthly_total, "17.75".parse::<BigDecimal>().unwrap());
        assert_eq!(sale.bank_account, "PENDING");
        assert_eq!(sale.sort_code, "PENDING");
        assert_eq!(sale.payment_status, "awaiting_details");
        assert_eq!(sale.agent_id, agent);
        assert!(sale.first_collection_date >= (before + Duration::days(14)).date_naive());
        assert!(sale.first_collection_date <= (after + Duration::days(14)).date_naive());

        let links: i64 = lead_sale_links::table
            .filter(lead_sale_links::lead_id.eq(lead.id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(links, 1);

        let item_count: i64 = sale_appliance_items::table
            .filter(sale_appliance_items::sale_id.eq(sale.id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(item_count, 2);

        let metadata: Option<serde_json::Value> = lead_dispositions::table
            .filter(lead_dispositions::lead_id.eq(lead.id))
            .select(lead_dispositions::metadata)
            .first(&mut conn)
            .unwrap();
        let sale_id_in_history = metadata
            .and_then(|m| m.get("sale_id").and_then(|v| v.as_str()).map(String::from));
        assert_eq!(sale_id_in_history, Some(sale.id.to_string()));

        // The checkout was released with the sale, so a follow-up is rejected.
        let result = disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::Cancelled,
            None,
            None,
            &workflow(),
        );
        assert!(matches!(result, Err(WorkflowError::LockViolation { .. })));

        // Re-holding the lock does not reopen a closed lead.
        diesel::update(leads::table.filter(leads::id.eq(lead.id)))
            .set((
                leads::checked_out_by.eq(agent),
                leads::checked_out_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .unwrap();
        let result = disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::Cancelled,
            None,
            None,
            &workflow(),
        );
        assert!(matches!(result, Err(WorkflowError::Validation(_))));

        // A non-terminal status cannot dodge the sale link either.
        diesel::update(leads::table.filter(leads::id.eq(lead.id)))
            .set(leads::status.eq("callback"))
            .execute(&mut conn)
            .unwrap();
        let result = disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::Cancelled,
            None,
            None,
            &workflow(),
        );
        assert!(matches!(result, Err(WorkflowError::AlreadyConverted(_))));

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_lock_violation_and_stale_lease_recovery() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();
        let intruder = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![record("Huw", "Bevan", "07700900006")],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let lead = outcome.lead.unwrap();

        let result = disposition::apply_disposition(
            &mut conn,
            lead.id,
            intruder,
            DispositionOutcome::Cancelled,
            None,
            None,
            &workflow(),
        );
        assert!(matches!(result, Err(WorkflowError::LockViolation { .. })));

        // While held, the lead is skipped but still counts as workable.
        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        assert!(outcome.lead.is_none());
        assert!(outcome.has_more);

        // Age the lease past the TTL; the next request sweeps and reclaims it.
        diesel::update(leads::table.filter(leads::id.eq(lead.id)))
            .set(leads::checked_out_at.eq(Utc::now() - Duration::minutes(31)))
            .execute(&mut conn)
            .unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let reclaimed = outcome.lead.unwrap();
        assert_eq!(reclaimed.id, lead.id);
        assert_eq!(reclaimed.checked_out_by, Some(agent));
        assert!(reclaimed.checked_out_at.unwrap() > Utc::now() - Duration::minutes(1));

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_requeue_returns_failed_conversion_to_queue() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();
        let operator = Uuid::new_v4();

        let created = import::create_lead(
            &mut conn,
            &CreateLeadRequest {
                first_name: "Seren".to_string(),
                last_name: "Price".to_string(),
                phone: "07700900007".to_string(),
                email: None,
                address_line1: None,
                address_line2: None,
                city: None,
                postcode: None,
                boiler_cover: None,
                boiler_cover_price: None,
                appliance_items: None,
                assigned_agent_id: agent,
                created_by: None,
                source: Some("manual".to_string()),
            },
        )
        .unwrap();
        let lead_id = created.lead.id;

        let result = disposition::requeue_conversion_failed(&mut conn, lead_id, operator);
        assert!(matches!(result, Err(WorkflowError::Validation(_))));

        diesel::update(leads::table.filter(leads::id.eq(lead_id)))
            .set(leads::status.eq("conversion_failed"))
            .execute(&mut conn)
            .unwrap();

        let requeued =
            disposition::requeue_conversion_failed(&mut conn, lead_id, operator).unwrap();
        assert_eq!(requeued.status, "called_no_answer");
        assert!(requeued.checked_out_by.is_none());

        let history: Vec<(Uuid, Option<serde_json::Value>)> = lead_dispositions::table
            .filter(lead_dispositions::lead_id.eq(lead_id))
            .select((lead_dispositions::agent_id, lead_dispositions::metadata))
            .load(&mut conn)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, operator);
        let from = history[0]
            .1
            .as_ref()
            .and_then(|m| m.get("requeued_from").and_then(|v| v.as_str()).map(String::from));
        assert_eq!(from.as_deref(), Some("conversion_failed"));

        let missing = disposition::requeue_conversion_failed(&mut conn, Uuid::new_v4(), operator);
        assert!(matches!(missing, Err(WorkflowError::NotFound(_))));

        cleanup(&mut conn, &[agent], None);
    }

    #[test]
    fn test_empty_queue_returns_no_lead() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        assert!(outcome.lead.is_none());
        assert!(!outcome.has_more);

        let counters = stats::agent_stats(&mut conn, agent, Utc::now()).unwrap();
        assert_eq!(counters.total_assigned, 0);
        assert_eq!(counters.contacted, 0);

        let released = checkout::release(&mut conn, Uuid::new_v4(), agent, Utc::now()).unwrap();
        assert!(!released);
    }

    #[test]
    fn test_do_not_call_leads_are_neither_served_nor_counted() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![record("Eleri", "Thomas", "07700900008")],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        // Flagged from a suppression list, so the status never left new.
        diesel::update(leads::table.filter(leads::assigned_agent_id.eq(agent)))
            .set(leads::do_not_call.eq(true))
            .execute(&mut conn)
            .unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        assert!(outcome.lead.is_none());
        assert!(!outcome.has_more);

        let counters = stats::agent_stats(&mut conn, agent, Utc::now()).unwrap();
        assert_eq!(counters.total_assigned, 0);

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_failed_sale_insert_lands_lead_in_conversion_failed() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        // Reject sale inserts for this one customer so the failure path runs.
        conn.batch_execute(
            "CREATE OR REPLACE FUNCTION reject_flagged_sale() RETURNS trigger AS $$
             BEGIN
                 IF NEW.phone = '07700900999' THEN
                     RAISE EXCEPTION 'account failed vetting';
                 END IF;
                 RETURN NEW;
             END;
             $$ LANGUAGE plpgsql;
             DROP TRIGGER IF EXISTS reject_flagged_sale ON sales;
             CREATE TRIGGER reject_flagged_sale BEFORE INSERT ON sales
                 FOR EACH ROW EXECUTE FUNCTION reject_flagged_sale();",
        )
        .unwrap();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![record("Gwen", "Parry", "07700900999")],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let lead = outcome.lead.unwrap();

        let applied = disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::SaleMade,
            Some("ready to sign".to_string()),
            None,
            &workflow(),
        )
        .unwrap();

        conn.batch_execute(
            "DROP TRIGGER IF EXISTS reject_flagged_sale ON sales;
             DROP FUNCTION IF EXISTS reject_flagged_sale();",
        )
        .unwrap();

        // The agent's request succeeded; the failure is parked, not surfaced.
        assert_eq!(applied.lead.status, "conversion_failed");
        assert!(applied.lead.checked_out_by.is_none());
        assert_eq!(applied.lead.last_disposition_by, Some(agent));
        assert!(applied.sale.is_none());

        let sale_count: i64 = sales::table
            .filter(sales::agent_id.eq(agent))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(sale_count, 0);
        let link_count: i64 = lead_sale_links::table
            .filter(lead_sale_links::lead_id.eq(lead.id))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(link_count, 0);

        let history: Vec<(String, Option<String>, Option<serde_json::Value>)> =
            lead_dispositions::table
                .filter(lead_dispositions::lead_id.eq(lead.id))
                .select((
                    lead_dispositions::status,
                    lead_dispositions::notes,
                    lead_dispositions::metadata,
                ))
                .load(&mut conn)
                .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, "conversion_failed");
        assert_eq!(history[0].1.as_deref(), Some("ready to sign"));
        let error_text = history[0]
            .2
            .as_ref()
            .and_then(|m| m.get("error").and_then(|v| v.as_str()).map(String::from))
            .unwrap_or_default();
        assert!(error_text.contains("creating sale"));

        // An operator can put it back in the queue through the normal path.
        let requeued = disposition::requeue_conversion_failed(&mut conn, lead.id, agent).unwrap();
        assert_eq!(requeued.status, "called_no_answer");

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }

    #[test]
    fn test_concurrent_checkout_has_a_single_winner() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent_a = Uuid::new_v4();
        let agent_b = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent_a],
            leads: vec![record("Bryn", "Walters", "07700900010")],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();
        let lead_id: Uuid = leads::table
            .filter(leads::assigned_agent_id.eq(agent_a))
            .select(leads::id)
            .first(&mut conn)
            .unwrap();

        // Free the pool slot so both claimants hold a connection at once.
        drop(conn);

        let pool_a = pool.clone();
        let pool_b = pool.clone();
        let (first, second) = std::thread::scope(|s| {
            let a = s.spawn(move || {
                let mut conn = pool_a.get().unwrap();
                checkout::checkout(&mut conn, lead_id, agent_a, Utc::now()).unwrap()
            });
            let b = s.spawn(move || {
                let mut conn = pool_b.get().unwrap();
                checkout::checkout(&mut conn, lead_id, agent_b, Utc::now()).unwrap()
            });
            (a.join().unwrap(), b.join().unwrap())
        });

        let winners = usize::from(first.is_some()) + usize::from(second.is_some());
        assert_eq!(winners, 1);

        let mut conn = pool.get().unwrap();
        let expected = if first.is_some() { agent_a } else { agent_b };
        let held_by: Option<Uuid> = leads::table
            .filter(leads::id.eq(lead_id))
            .select(leads::checked_out_by)
            .first(&mut conn)
            .unwrap();
        assert_eq!(held_by, Some(expected));

        // A later claim against the held lead loses cleanly as well.
        let retry = checkout::checkout(&mut conn, lead_id, Uuid::new_v4(), Utc::now()).unwrap();
        assert!(retry.is_none());

        cleanup(&mut conn, &[agent_a, agent_b], Some(imported.batch_id));
    }

    #[test]
    fn test_checkout_passes_over_a_closed_lead() {
        let pool = match test_pool() {
            Some(pool) => pool,
            None => return,
        };
        let mut conn = pool.get().unwrap();
        let agent = Uuid::new_v4();

        let request = ImportLeadsRequest {
            source: "integration_feed".to_string(),
            label: None,
            created_by: None,
            agent_ids: vec![agent],
            leads: vec![record("Alys", "Hopkin", "07700900011")],
        };
        let imported = import::import_batch(&mut conn, &request).unwrap();

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        let lead = outcome.lead.unwrap();
        disposition::apply_disposition(
            &mut conn,
            lead.id,
            agent,
            DispositionOutcome::Cancelled,
            None,
            None,
            &workflow(),
        )
        .unwrap();

        // Unlocked again but closed; a claim off a stale candidate list must miss.
        let claimed = checkout::checkout(&mut conn, lead.id, agent, Utc::now()).unwrap();
        assert!(claimed.is_none());

        let outcome = selection::next_lead_for_agent(&mut conn, agent, &workflow()).unwrap();
        assert!(outcome.lead.is_none());
        assert!(!outcome.has_more);

        cleanup(&mut conn, &[agent], Some(imported.batch_id));
    }
}
