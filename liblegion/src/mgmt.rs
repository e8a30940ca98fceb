//! Uniform client for the OS management-instrumentation service.
//!
//! Every vendor control surface above the HID layer (thermal profiles, TDP
//! features, monitor brightness, inventory strings) is reached through the
//! same sequence: connect to a namespace, enumerate instances of a class,
//! build a method-input object, invoke, read a field off the output. The
//! [`Management`] trait captures that sequence once; callers describe a call
//! declaratively and never see the plumbing.
//!
//! Failure policy: any step can fail on machines that lack a given vendor
//! extension, and that is an expected condition, not an error. Every call
//! collapses failure into "no data" / "no effect" so the rest of the app
//! keeps working with defaults.

/// Scalar argument or result of a management call.
#[derive(Debug, Clone, PartialEq)]
pub enum MgmtValue {
    Int(i32),
    Byte(u8),
    Text(String),
}

impl MgmtValue {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            MgmtValue::Int(value) => Some(*value),
            MgmtValue::Byte(value) => Some(i32::from(*value)),
            MgmtValue::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            MgmtValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Namespace holding the vendor hardware-control classes.
pub const HARDWARE_NAMESPACE: &str = "ROOT\\WMI";
/// Namespace for general machine inventory queries.
pub const INVENTORY_NAMESPACE: &str = "ROOT\\CIMV2";

/// Class exposing the opaque tunable-feature getter/setter pair.
pub const FEATURE_CLASS: &str = "LENOVO_OTHER_METHOD";

/// Declarative access to the management-instrumentation service.
///
/// Implementations provide the three primitives; the feature-level
/// operations are derived from them so a test double only fakes the
/// primitives.
pub trait Management {
    /// Invoke `method` on the first instance of `class` (hardware
    /// namespace), optionally returning one field of the output object.
    /// `None` means any step of the chain failed or the method has no
    /// output.
    fn invoke(
        &self,
        class: &str,
        method: &str,
        args: &[(&str, MgmtValue)],
        out_field: Option<&str>,
    ) -> Option<MgmtValue>;

    /// Invoke `method` with `args` on every instance of `class`. A class
    /// with zero instances makes this a no-op.
    fn invoke_all(&self, class: &str, method: &str, args: &[(&str, MgmtValue)]);

    /// Run a WQL query and collect `field` from every row.
    fn query_all(&self, namespace: &str, query: &str, field: &str) -> Vec<MgmtValue>;

    /// First row of [`Management::query_all`], or absent.
    fn query_scalar(&self, namespace: &str, query: &str, field: &str) -> Option<MgmtValue> {
        self.query_all(namespace, query, field).into_iter().next()
    }

    /// Read an opaque vendor feature. 0 when the feature (or the whole
    /// class) is absent.
    fn get_feature_value(&self, feature_id: i32) -> i32 {
        self.invoke(
            FEATURE_CLASS,
            "GetFeatureValue",
            &[("IDs", MgmtValue::Int(feature_id))],
            Some("Value"),
        )
        .and_then(|value| value.as_i32())
        .unwrap_or(0)
    }

    /// Write an opaque vendor feature. Silent on failure.
    fn set_feature_value(&self, feature_id: i32, value: i32) {
        self.invoke(
            FEATURE_CLASS,
            "SetFeatureValue",
            &[("IDs", MgmtValue::Int(feature_id)), ("Value", MgmtValue::Int(value))],
            None,
        );
    }

    /// One-argument method invocation used by the fan/ownership toggles.
    fn exec_simple_method(&self, class: &str, method: &str, data: i32) {
        self.invoke(class, method, &[("Data", MgmtValue::Int(data))], None);
    }
}

impl<M: Management + ?Sized> Management for &M {
    fn invoke(
        &self,
        class: &str,
        method: &str,
        args: &[(&str, MgmtValue)],
        out_field: Option<&str>,
    ) -> Option<MgmtValue> {
        (**self).invoke(class, method, args, out_field)
    }

    fn invoke_all(&self, class: &str, method: &str, args: &[(&str, MgmtValue)]) {
        (**self).invoke_all(class, method, args)
    }

    fn query_all(&self, namespace: &str, query: &str, field: &str) -> Vec<MgmtValue> {
        (**self).query_all(namespace, query, field)
    }
}

/// Production client. Carries no connection: each call performs the full
/// connect/enumerate/invoke dance and releases everything, mirroring how the
/// service is designed to be used from short-lived apartment threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct WmiClient;

impl WmiClient {
    pub fn new() -> Self {
        WmiClient
    }
}

#[cfg(windows)]
impl Management for WmiClient {
    fn invoke(
        &self,
        class: &str,
        method: &str,
        args: &[(&str, MgmtValue)],
        out_field: Option<&str>,
    ) -> Option<MgmtValue> {
        com::invoke(class, method, args, out_field)
    }

    fn invoke_all(&self, class: &str, method: &str, args: &[(&str, MgmtValue)]) {
        com::invoke_all(class, method, args);
    }

    fn query_all(&self, namespace: &str, query: &str, field: &str) -> Vec<MgmtValue> {
        com::query_all(namespace, query, field)
    }
}

#[cfg(not(windows))]
impl Management for WmiClient {
    fn invoke(
        &self,
        class: &str,
        method: &str,
        _args: &[(&str, MgmtValue)],
        _out_field: Option<&str>,
    ) -> Option<MgmtValue> {
        log::debug!("management unavailable off-windows: {class}.{method}");
        None
    }

    fn invoke_all(&self, _class: &str, _method: &str, _args: &[(&str, MgmtValue)]) {}

    fn query_all(&self, _namespace: &str, _query: &str, _field: &str) -> Vec<MgmtValue> {
        Vec::new()
    }
}

#[cfg(windows)]
mod com {
    //! Raw COM plumbing behind [`super::WmiClient`]. Everything in here maps
    //! 1:1 onto the documented semi-synchronous WMI call sequence; all
    //! errors become `None`.

    use log::debug;
    use windows::core::{BSTR, HSTRING, PCWSTR, VARIANT};
    use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CoSetProxyBlanket, CoUninitialize,
        CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED, EOAC_NONE, RPC_C_AUTHN_LEVEL_CALL,
        RPC_C_IMP_LEVEL_IMPERSONATE,
    };
    use windows::Win32::System::Rpc::{RPC_C_AUTHN_WINNT, RPC_C_AUTHZ_NONE};
    use windows::Win32::System::Wmi::{
        IEnumWbemClassObject, IWbemClassObject, IWbemLocator, IWbemServices, WbemLocator,
        WBEM_FLAG_FORWARD_ONLY, WBEM_FLAG_RETURN_IMMEDIATELY, WBEM_INFINITE,
    };

    use super::{MgmtValue, HARDWARE_NAMESPACE};

    /// Connect to `namespace`, run `body`, and balance the COM init.
    fn with_services<T>(
        namespace: &str,
        body: impl FnOnce(&IWbemServices) -> Option<T>,
    ) -> Option<T> {
        unsafe {
            let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
            if hr.is_err() && hr != RPC_E_CHANGED_MODE {
                return None;
            }
            let balance_com = hr.is_ok();
            let result = (|| {
                let locator: IWbemLocator =
                    CoCreateInstance(&WbemLocator, None, CLSCTX_INPROC_SERVER).ok()?;
                let services = locator
                    .ConnectServer(
                        &BSTR::from(namespace),
                        &BSTR::new(),
                        &BSTR::new(),
                        &BSTR::new(),
                        0,
                        &BSTR::new(),
                        None,
                    )
                    .ok()?;
                if CoSetProxyBlanket(
                    &services,
                    RPC_C_AUTHN_WINNT,
                    RPC_C_AUTHZ_NONE,
                    PCWSTR::null(),
                    RPC_C_AUTHN_LEVEL_CALL,
                    RPC_C_IMP_LEVEL_IMPERSONATE,
                    None,
                    EOAC_NONE,
                )
                .is_err()
                {
                    debug!("management proxy blanket rejected for {namespace}");
                }
                body(&services)
            })();
            if balance_com {
                CoUninitialize();
            }
            result
        }
    }

    fn next_object(enumerator: &IEnumWbemClassObject) -> Option<IWbemClassObject> {
        unsafe {
            let mut row: [Option<IWbemClassObject>; 1] = [None];
            let mut returned = 0u32;
            let hr = enumerator.Next(WBEM_INFINITE.0, &mut row, &mut returned);
            if hr.is_err() || returned == 0 {
                return None;
            }
            row[0].take()
        }
    }

    fn field_of(object: &IWbemClassObject, field: &str) -> Option<MgmtValue> {
        unsafe {
            let mut value = VARIANT::default();
            let name = HSTRING::from(field);
            object.Get(&name, 0, &mut value, None, None).ok()?;
            if let Ok(number) = i32::try_from(&value) {
                return Some(MgmtValue::Int(number));
            }
            if let Ok(text) = BSTR::try_from(&value) {
                return Some(MgmtValue::Text(text.to_string()));
            }
            None
        }
    }

    fn object_path(object: &IWbemClassObject) -> Option<String> {
        match field_of(object, "__PATH")? {
            MgmtValue::Text(path) => Some(path),
            _ => None,
        }
    }

    /// Instance paths of `class`, in enumeration order. Empty when the class
    /// does not exist on this machine.
    fn instance_paths(services: &IWbemServices, class: &str) -> Vec<String> {
        let mut paths = Vec::new();
        let enumerator = unsafe {
            services.CreateInstanceEnum(
                &BSTR::from(class),
                WBEM_FLAG_FORWARD_ONLY.0 | WBEM_FLAG_RETURN_IMMEDIATELY.0,
                None,
            )
        };
        let Ok(enumerator) = enumerator else {
            return paths;
        };
        while let Some(instance) = next_object(&enumerator) {
            if let Some(path) = object_path(&instance) {
                paths.push(path);
            }
        }
        paths
    }

    /// Build the method-input object: class definition → method in-signature
    /// → spawned instance → arguments written in. Methods without input
    /// parameters short-circuit to `None` via the empty-args check in the
    /// callers.
    fn build_input(
        services: &IWbemServices,
        class: &str,
        method: &str,
        args: &[(&str, MgmtValue)],
    ) -> Option<IWbemClassObject> {
        unsafe {
            let mut class_def: Option<IWbemClassObject> = None;
            services
                .GetObject(&BSTR::from(class), 0, None, Some(&mut class_def), None)
                .ok()?;
            let class_def = class_def?;

            let mut in_signature: Option<IWbemClassObject> = None;
            class_def
                .GetMethod(&HSTRING::from(method), 0, Some(&mut in_signature), None)
                .ok()?;
            let input = in_signature?.SpawnInstance(0).ok()?;

            for (name, value) in args {
                let variant = match value {
                    MgmtValue::Int(v) => VARIANT::from(*v),
                    MgmtValue::Byte(v) => VARIANT::from(*v),
                    MgmtValue::Text(v) => VARIANT::from(v.as_str()),
                };
                input.Put(&HSTRING::from(*name), 0, &variant, 0).ok()?;
            }
            Some(input)
        }
    }

    fn exec_on_path(
        services: &IWbemServices,
        path: &str,
        method: &str,
        input: Option<&IWbemClassObject>,
    ) -> Option<IWbemClassObject> {
        unsafe {
            let mut output: Option<IWbemClassObject> = None;
            services
                .ExecMethod(
                    &BSTR::from(path),
                    &BSTR::from(method),
                    0,
                    None,
                    input,
                    Some(&mut output),
                    None,
                )
                .ok()?;
            output
        }
    }

    pub fn invoke(
        class: &str,
        method: &str,
        args: &[(&str, MgmtValue)],
        out_field: Option<&str>,
    ) -> Option<MgmtValue> {
        with_services(HARDWARE_NAMESPACE, |services| {
            let path = instance_paths(services, class).into_iter().next()?;
            let input = if args.is_empty() {
                None
            } else {
                Some(build_input(services, class, method, args)?)
            };
            let output = exec_on_path(services, &path, method, input.as_ref());
            let field = out_field?;
            field_of(&output?, field)
        })
    }

    pub fn invoke_all(class: &str, method: &str, args: &[(&str, MgmtValue)]) {
        with_services(HARDWARE_NAMESPACE, |services| {
            let input = if args.is_empty() {
                None
            } else {
                Some(build_input(services, class, method, args)?)
            };
            for path in instance_paths(services, class) {
                exec_on_path(services, &path, method, input.as_ref());
            }
            Some(())
        });
    }

    pub fn query_all(namespace: &str, query: &str, field: &str) -> Vec<MgmtValue> {
        with_services(namespace, |services| {
            let rows = unsafe {
                services
                    .ExecQuery(
                        &BSTR::from("WQL"),
                        &BSTR::from(query),
                        WBEM_FLAG_FORWARD_ONLY.0 | WBEM_FLAG_RETURN_IMMEDIATELY.0,
                        None,
                    )
                    .ok()?
            };
            let mut values = Vec::new();
            while let Some(row) = next_object(&rows) {
                if let Some(value) = field_of(&row, field) {
                    values.push(value);
                }
            }
            Some(values)
        })
        .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording double for the management trait. Fakes the three
    //! primitives; the derived feature operations are exercised against it.

    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{Management, MgmtValue};

    /// One recorded `invoke`/`invoke_all` call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub class: String,
        pub method: String,
        pub args: Vec<(String, MgmtValue)>,
    }

    #[derive(Default)]
    pub struct MockManagement {
        pub calls: RefCell<Vec<RecordedCall>>,
        /// Responses for `invoke`, keyed by (class, method).
        pub responses: RefCell<HashMap<(String, String), MgmtValue>>,
        /// Rows for `query_all`, keyed by field name.
        pub rows: RefCell<HashMap<String, Vec<MgmtValue>>>,
        /// When true every call behaves as if the class had no instances.
        pub absent: bool,
    }

    impl MockManagement {
        pub fn respond(&self, class: &str, method: &str, value: MgmtValue) {
            self.responses
                .borrow_mut()
                .insert((class.to_string(), method.to_string()), value);
        }

        pub fn calls_named(&self, method: &str) -> Vec<RecordedCall> {
            self.calls
                .borrow()
                .iter()
                .filter(|call| call.method == method)
                .cloned()
                .collect()
        }
    }

    impl Management for MockManagement {
        fn invoke(
            &self,
            class: &str,
            method: &str,
            args: &[(&str, MgmtValue)],
            _out_field: Option<&str>,
        ) -> Option<MgmtValue> {
            if self.absent {
                return None;
            }
            self.calls.borrow_mut().push(RecordedCall {
                class: class.to_string(),
                method: method.to_string(),
                args: args.iter().map(|(n, v)| (n.to_string(), v.clone())).collect(),
            });
            self.responses
                .borrow()
                .get(&(class.to_string(), method.to_string()))
                .cloned()
        }

        fn invoke_all(&self, class: &str, method: &str, args: &[(&str, MgmtValue)]) {
            self.invoke(class, method, args, None);
        }

        fn query_all(&self, _namespace: &str, _query: &str, field: &str) -> Vec<MgmtValue> {
            if self.absent {
                return Vec::new();
            }
            self.rows.borrow().get(field).cloned().unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockManagement;
    use super::*;

    #[test]
    fn feature_read_degrades_to_zero_when_class_is_absent() {
        let mgmt = MockManagement { absent: true, ..Default::default() };
        assert_eq!(mgmt.get_feature_value(16_973_568), 0);
    }

    #[test]
    fn feature_read_unwraps_the_value_field() {
        let mgmt = MockManagement::default();
        mgmt.respond(FEATURE_CLASS, "GetFeatureValue", MgmtValue::Int(25_000));
        assert_eq!(mgmt.get_feature_value(16_973_568), 25_000);
    }

    #[test]
    fn feature_write_sends_id_and_value() {
        let mgmt = MockManagement::default();
        mgmt.set_feature_value(16_908_032, 20_000);
        let calls = mgmt.calls_named("SetFeatureValue");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].class, FEATURE_CLASS);
        assert_eq!(
            calls[0].args,
            vec![
                ("IDs".to_string(), MgmtValue::Int(16_908_032)),
                ("Value".to_string(), MgmtValue::Int(20_000)),
            ]
        );
    }

    #[test]
    fn simple_method_wraps_data_argument() {
        let mgmt = MockManagement::default();
        mgmt.exec_simple_method("LENOVO_GAMEZONE_DATA", "SetSmartFanMode", 2);
        let calls = mgmt.calls_named("SetSmartFanMode");
        assert_eq!(calls[0].args, vec![("Data".to_string(), MgmtValue::Int(2))]);
    }

    #[test]
    fn query_scalar_is_first_row_or_absent() {
        let mgmt = MockManagement::default();
        mgmt.rows
            .borrow_mut()
            .insert("CurrentBrightness".to_string(), vec![MgmtValue::Byte(70), MgmtValue::Byte(40)]);
        assert_eq!(
            mgmt.query_scalar(HARDWARE_NAMESPACE, "SELECT ...", "CurrentBrightness"),
            Some(MgmtValue::Byte(70))
        );
        assert_eq!(mgmt.query_scalar(HARDWARE_NAMESPACE, "SELECT ...", "Missing"), None);
    }

    #[test]
    fn value_conversions() {
        assert_eq!(MgmtValue::Int(12).as_i32(), Some(12));
        assert_eq!(MgmtValue::Byte(200).as_i32(), Some(200));
        assert_eq!(MgmtValue::Text("x".into()).as_i32(), None);
        assert_eq!(MgmtValue::Text("Legion Go".into()).into_text().as_deref(), Some("Legion Go"));
    }
}
