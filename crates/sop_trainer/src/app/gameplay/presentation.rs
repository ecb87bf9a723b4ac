/// Reports the checklist and outcome banners through tracing.
#[derive(Debug, Default)]
pub(crate) struct LogPresentation {
    checklist: BTreeMap<String, TaskStatus>,
    fire_burning: bool,
    banners: Vec<&'static str>,
}

impl LogPresentation {
    pub(crate) fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.checklist.get(task).copied()
    }

    pub(crate) fn fire_burning(&self) -> bool {
        self.fire_burning
    }

    pub(crate) fn banners(&self) -> &[&'static str] {
        &self.banners
    }
}

impl Presentation for LogPresentation {
    fn task_status_changed(&mut self, task: &Task, status: TaskStatus) {
        self.checklist.insert(task.name().to_string(), status);
        info!(
            task = task.name(),
            description = task.description(),
            ?status,
            "checklist_updated"
        );
    }

    fn procedure_succeeded(&mut self) {
        self.banners.push("success");
        info!("procedure_succeeded");
    }

    fn procedure_failed(&mut self) {
        self.banners.push("failure");
        warn!("procedure_failed");
    }

    fn fire_started(&mut self) {
        self.fire_burning = true;
        warn!("fire_started");
    }

    fn fire_extinguished(&mut self) {
        self.fire_burning = false;
        info!("fire_extinguished");
    }

    fn procedure_reset(&mut self) {
        self.banners.push("reset");
        info!(tasks = self.checklist.len(), "checklist_reset");
    }
}
