// Built-in catalog tables. Operators can replace or extend these through a
// catalog file, see `CatalogConfig`.
//
// A pattern ending in '.' is a namespace prefix; anything else is an exact
// call surface.

pub const PERMISSION_PATTERNS: &[(&str, &[&str])] = &[
    ("alarms", &["chrome.alarms."]),
    ("bookmarks", &["chrome.bookmarks."]),
    ("browsingData", &["chrome.browsingData."]),
    (
        "clipboardRead",
        &["navigator.clipboard.readText", "navigator.clipboard.read"],
    ),
    (
        "clipboardWrite",
        &["navigator.clipboard.writeText", "navigator.clipboard.write"],
    ),
    ("contentSettings", &["chrome.contentSettings."]),
    ("contextMenus", &["chrome.contextMenus."]),
    ("cookies", &["chrome.cookies."]),
    ("debugger", &["chrome.debugger."]),
    ("declarativeContent", &["chrome.declarativeContent."]),
    ("declarativeNetRequest", &["chrome.declarativeNetRequest."]),
    (
        "declarativeNetRequestFeedback",
        &["chrome.declarativeNetRequest.onRuleMatchedDebug.", "chrome.declarativeNetRequest.getMatchedRules"],
    ),
    ("desktopCapture", &["chrome.desktopCapture."]),
    ("dns", &["chrome.dns."]),
    ("downloads", &["chrome.downloads."]),
    ("fontSettings", &["chrome.fontSettings."]),
    ("gcm", &["chrome.gcm."]),
    (
        "geolocation",
        &[
            "navigator.geolocation.getCurrentPosition",
            "navigator.geolocation.watchPosition",
        ],
    ),
    ("history", &["chrome.history."]),
    ("identity", &["chrome.identity."]),
    ("idle", &["chrome.idle."]),
    ("management", &["chrome.management."]),
    (
        "nativeMessaging",
        &["chrome.runtime.sendNativeMessage", "chrome.runtime.connectNative"],
    ),
    ("notifications", &["chrome.notifications."]),
    ("offscreen", &["chrome.offscreen."]),
    ("pageCapture", &["chrome.pageCapture."]),
    ("power", &["chrome.power."]),
    ("printerProvider", &["chrome.printerProvider."]),
    ("privacy", &["chrome.privacy."]),
    ("proxy", &["chrome.proxy."]),
    ("readingList", &["chrome.readingList."]),
    ("scripting", &["chrome.scripting."]),
    ("search", &["chrome.search."]),
    ("sessions", &["chrome.sessions."]),
    ("sidePanel", &["chrome.sidePanel."]),
    ("storage", &["chrome.storage."]),
    ("system.cpu", &["chrome.system.cpu."]),
    ("system.display", &["chrome.system.display."]),
    ("system.memory", &["chrome.system.memory."]),
    ("system.storage", &["chrome.system.storage."]),
    ("tabCapture", &["chrome.tabCapture."]),
    ("tabGroups", &["chrome.tabGroups."]),
    ("tabs", &["chrome.tabs."]),
    ("topSites", &["chrome.topSites."]),
    ("tts", &["chrome.tts."]),
    ("ttsEngine", &["chrome.ttsEngine."]),
    ("userScripts", &["chrome.userScripts."]),
    ("webNavigation", &["chrome.webNavigation."]),
    ("webRequest", &["chrome.webRequest."]),
    ("webRequestBlocking", &["chrome.webRequest."]),
];

pub const API_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "File System",
        &[
            "document.querySelector('input[type=\"file\"]')",
            "file.name",
            "file.type",
            "file.size",
            "file.lastModified",
            "new Blob",
            "FileReader.readAsText",
            "FileReader.readAsDataURL",
            "FileReader.readAsArrayBuffer",
            "window.requestFileSystem",
            "fileEntry.createWriter",
            "indexedDB.open",
            "indexedDB.transaction",
            "store.put",
            "localStorage.setItem",
            "localStorage.getItem",
            "sessionStorage.setItem",
            "sessionStorage.getItem",
            "document.cookie",
            "navigator.clipboard.readText",
            "navigator.clipboard.writeText",
        ],
    ),
    (
        "Network",
        &[
            "fetch",
            "new XMLHttpRequest",
            "new WebSocket",
            "navigator.sendBeacon",
            "new RTCPeerConnection",
            "chrome.webRequest.onBeforeRequest.addListener",
            "chrome.webRequest.onHeadersReceived.addListener",
            "chrome.identity.getAuthToken",
            "chrome.proxy.settings.set",
            "chrome.dns.resolve",
        ],
    ),
    (
        "Rendering",
        &[
            "document.createElement",
            "document.appendChild",
            "element.innerHTML",
            "document.querySelector",
            "document.getElementById",
            "element.style",
            "new MutationObserver",
            "chrome.tabs.executeScript",
            "setTimeout",
            "setInterval",
            "canvas.getContext",
            "CanvasRenderingContext2D.drawImage",
            "document.designMode",
            "shadowRoot.attachShadow",
            "window.open",
            "chrome.windows.create",
            "chrome.tabs.create",
            "chrome.notifications.create",
        ],
    ),
    (
        "User Interaction",
        &[
            "addEventListener",
            "document.onmousemove",
            "document.onkeypress",
            "document.onkeydown",
            "window.onbeforeunload",
            "chrome.contextMenus.create",
            "chrome.alarms.create",
            "chrome.notifications.onClicked.addListener",
            "chrome.permissions.request",
            "chrome.tabs.onActivated.addListener",
            "window.alert",
            "window.confirm",
            "window.prompt",
        ],
    ),
];

/// Extension namespaces that are spelled differently per browser.
/// Permissions whose misuse exposes browsing data, traffic or the host system.
pub const HIGH_RISK_PERMISSIONS: &[&str] = &[
    "webRequest",
    "webRequestBlocking",
    "clipboardRead",
    "clipboardWrite",
    "nativeMessaging",
    "proxy",
    "debugger",
    "downloads",
    "management",
    "history",
    "cookies",
    "bookmarks",
];

pub const NAMESPACE_ALIASES: &[(&str, &str)] = &[("browser", "chrome")];

/// Host permission shapes never correlate against API patterns.
pub const HOST_PERMISSION_PREFIXES: &[&str] = &["<", "*:"];
